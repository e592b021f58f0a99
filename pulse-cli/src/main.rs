use anyhow::{Context, Result, bail, ensure};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use env_logger::Env;
use log::{info, warn};
use std::time::Duration;
use tokio::time::Instant;

use pulse::config::ExerciseConfig;
use pulse::health::{ExerciseMetrics, ExerciseStatus, ExerciseType, RandomReadings};
use pulse::session::{ExerciseService, ExerciseSummary, PendingStart, format_clock};

use crossterm::event::{self, KeyCode, KeyEventKind};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Alignment, Constraint, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const IDLE_HELP: &str = "t: type | s: start | q: quit";
const EXERCISING_HELP: &str = "p: pause/resume | e: end | q: quit";

#[derive(Parser, Debug)]
#[command(version, about = "Pulse - Exercise Tracker CLI", long_about = None)]
struct Args {
    /// Sensor warm-up delay in milliseconds
    #[arg(long, global = true)]
    warmup_ms: Option<u64>,
    /// Metrics sampling period in milliseconds
    #[arg(long, global = true)]
    sample_interval_ms: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive watch face
    Track {
        #[arg(short = 't', long = "type", default_value = "running")]
        exercise_type: ExerciseType,
    },
    /// Run a session without a UI and print every sample
    Simulate {
        #[arg(short = 't', long = "type", default_value = "running")]
        exercise_type: ExerciseType,
        #[arg(short = 'n', long, default_value_t = 5)]
        ticks: u32,
        /// Pause for one sampling period after this tick
        #[arg(long)]
        pause_after: Option<u32>,
        /// Seed for reproducible readings
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        json: bool,
    },
    /// List the supported exercise types
    Types,
}

struct WatchFace {
    exercise_type: ExerciseType,
    pending: Option<PendingStart>,
    exercising: bool,
    paused: bool,
    // Seconds shown on the clock, counted here rather than by the service.
    timer: u64,
    metrics: Option<ExerciseMetrics>,
    last_summary: Option<ExerciseSummary>,
    status_message: String,
    last_sample: Instant,
    last_second: Instant,
}

impl WatchFace {
    fn new(exercise_type: ExerciseType) -> Self {
        let now = Instant::now();
        Self {
            exercise_type,
            pending: None,
            exercising: false,
            paused: false,
            timer: 0,
            metrics: None,
            last_summary: None,
            status_message: IDLE_HELP.to_string(),
            last_sample: now,
            last_second: now,
        }
    }

    fn ticking(&self) -> bool {
        self.exercising && !self.paused
    }

    fn restart_ticks(&mut self) {
        let now = Instant::now();
        self.last_sample = now;
        self.last_second = now;
    }

    fn cycle_type(&mut self) {
        if self.exercising || self.pending.is_some() {
            return;
        }
        self.exercise_type = self.exercise_type.next();
        self.status_message = format!("Exercise type: {}", self.exercise_type);
    }

    async fn start(&mut self, service: &ExerciseService) {
        if self.exercising || self.pending.is_some() {
            return;
        }
        match service.start(self.exercise_type).await {
            Ok(pending) => {
                self.status_message = format!("Preparing {}...", self.exercise_type);
                self.pending = Some(pending);
            }
            Err(e) => {
                warn!("Error starting exercise: {}", e);
                self.status_message = format!("Failed to start exercise: {}", e);
            }
        }
    }

    /// Promote a pending start once the service reports it active.
    async fn settle_pending(&mut self, service: &ExerciseService) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let still_preparing = service.current().await.is_some_and(|s| {
            s.id == pending.session_id() && s.status == ExerciseStatus::Preparing
        });
        if still_preparing {
            self.pending = Some(pending);
            return;
        }

        match pending.wait().await {
            Ok(active) => {
                self.exercising = true;
                self.paused = false;
                self.timer = 0;
                self.metrics = None;
                self.restart_ticks();
                self.status_message = format!("{} started | {}", active.exercise_type, EXERCISING_HELP);
            }
            Err(e) => {
                self.status_message = format!("Failed to start exercise: {}", e);
            }
        }
    }

    async fn toggle_pause(&mut self, service: &ExerciseService) {
        if !self.exercising {
            return;
        }
        if self.paused {
            if service.resume().await.is_some() {
                self.paused = false;
                self.restart_ticks();
                self.status_message = format!("Resumed | {}", EXERCISING_HELP);
            }
        } else if service.pause().await.is_some() {
            self.paused = true;
            self.status_message = format!("Paused | {}", EXERCISING_HELP);
        }
    }

    async fn end(&mut self, service: &ExerciseService) {
        if let Some(pending) = self.pending.take() {
            pending.cancel().await;
            self.status_message = format!("Start cancelled | {}", IDLE_HELP);
            return;
        }
        if !self.exercising {
            return;
        }

        let ended = service.end().await;
        self.exercising = false;
        self.paused = false;
        self.timer = 0;
        self.metrics = None;
        match ended {
            Some(session) => {
                let summary = ExerciseSummary::from(&session);
                self.status_message = format!("{}\n{}", summary, IDLE_HELP);
                self.last_summary = Some(summary);
            }
            None => self.status_message = IDLE_HELP.to_string(),
        }
    }

    async fn tick(&mut self, service: &ExerciseService) {
        if !self.ticking() {
            return;
        }
        let config = service.config();
        let now = Instant::now();

        while now.duration_since(self.last_second) >= config.display_interval {
            self.timer += 1;
            self.last_second += config.display_interval;
        }

        if now.duration_since(self.last_sample) >= config.sample_interval {
            self.last_sample = now;
            if let Some(metrics) = service.sample().await {
                self.metrics = Some(metrics);
            }
        }
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(7),
        ])
        .split(frame.area());

        let state = if self.pending.is_some() {
            "preparing"
        } else if self.paused {
            "paused"
        } else if self.exercising {
            "active"
        } else {
            "idle"
        };
        let header = Paragraph::new(format!("Pulse - {} ({})", self.exercise_type, state))
            .style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        let clock = Paragraph::new(format_clock(self.timer))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL).title("Time"));
        frame.render_widget(clock, chunks[1]);

        let metrics = self.metrics.unwrap_or_default();
        let dash_if_zero = |v: f64, text: String| if v > 0.0 { text } else { "—".to_string() };
        let items = vec![
            ListItem::new(format!("Heart rate  {} bpm", metrics.heart_rate_bpm))
                .style(Style::default().fg(Color::Red)),
            ListItem::new(format!("Calories    {:.1}", metrics.calories))
                .style(Style::default().fg(Color::Yellow)),
            ListItem::new(format!(
                "Distance    {}",
                dash_if_zero(metrics.distance, format!("{:.2} km", metrics.distance))
            ))
            .style(Style::default().fg(Color::Blue)),
            ListItem::new(format!(
                "Steps       {}",
                dash_if_zero(metrics.steps as f64, metrics.steps.to_string())
            ))
            .style(Style::default().fg(Color::Green)),
        ];
        let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Metrics"));
        frame.render_widget(list, chunks[2]);

        let footer = Paragraph::new(self.status_message.as_str())
            .style(Style::default().fg(Color::White))
            .block(Block::default().borders(Borders::ALL).title("Status"));
        frame.render_widget(footer, chunks[3]);
    }
}

fn render_unavailable(frame: &mut Frame) {
    let message = Paragraph::new("Exercise not available on this device\n\nq: quit")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL).title("Pulse"));
    frame.render_widget(message, frame.area());
}

async fn run_watch_face(
    mut terminal: DefaultTerminal,
    service: &ExerciseService,
    exercise_type: ExerciseType,
) -> Result<Option<ExerciseSummary>> {
    if !service.is_available() {
        loop {
            terminal.draw(render_unavailable)?;
            if let event::Event::Key(key) = event::read()? {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc) {
                    return Ok(None);
                }
            }
        }
    }

    let mut watch = WatchFace::new(exercise_type);

    loop {
        terminal.draw(|frame| watch.render(frame))?;

        if event::poll(POLL_INTERVAL)? {
            if let event::Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => {
                            watch.end(service).await;
                            return Ok(watch.last_summary);
                        }
                        KeyCode::Char('t') | KeyCode::Char('T') => watch.cycle_type(),
                        KeyCode::Char('s') | KeyCode::Char('S') => watch.start(service).await,
                        KeyCode::Char('p') | KeyCode::Char('P') => watch.toggle_pause(service).await,
                        KeyCode::Char('e') | KeyCode::Char('E') => watch.end(service).await,
                        _ => {}
                    }
                }
            }
        }

        watch.settle_pending(service).await;
        watch.tick(service).await;
    }
}

async fn simulate(
    service: &ExerciseService,
    exercise_type: ExerciseType,
    ticks: u32,
    pause_after: Option<u32>,
    json: bool,
) -> Result<()> {
    if !service.is_available() {
        bail!("Health services are not available on this device");
    }

    let pending = service.start(exercise_type).await?;
    info!("Session {} preparing", pending.session_id());
    let active = pending.wait().await?;
    info!("Session {} active", active.id);

    let mut interval = tokio::time::interval(service.config().sample_interval);
    // The first tick completes immediately.
    interval.tick().await;

    for n in 1..=ticks {
        interval.tick().await;
        let Some(metrics) = service.sample().await else {
            warn!("No sample on tick {}", n);
            continue;
        };
        if json {
            println!(
                "{}",
                serde_json::to_string(&serde_json::json!({ "tick": n, "metrics": metrics }))?
            );
        } else {
            println!(
                "[{:>3}] {} bpm | {:.2} km | {:.1} cal | {} steps | {} floors",
                n,
                metrics.heart_rate_bpm,
                metrics.distance,
                metrics.calories,
                metrics.steps,
                metrics.floors
            );
        }

        if pause_after == Some(n) {
            service.pause().await.context("session was not active")?;
            info!("Paused for one sampling period");
            interval.tick().await;
            if service.sample().await.is_none() {
                info!("Sample skipped while paused");
            }
            service.resume().await.context("session was not paused")?;
        }
    }

    let ended = service
        .end()
        .await
        .context("session left the slot before it could be ended")?;
    if json {
        println!("{}", serde_json::to_string(&ended)?);
    } else {
        println!("\nExercise Summary\n{}", ExerciseSummary::from(&ended));
    }
    Ok(())
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    dotenv().ok();

    let args = Args::parse();
    let mut config = ExerciseConfig::from_env()?;
    if let Some(ms) = args.warmup_ms {
        config.warmup = Duration::from_millis(ms);
    }
    if let Some(ms) = args.sample_interval_ms {
        ensure!(ms > 0, "--sample-interval-ms must be greater than zero");
        config.sample_interval = Duration::from_millis(ms);
    }

    match args.command {
        Commands::Track { exercise_type } => {
            // Anything chattier than warnings would scribble over the watch face.
            env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
            let service = ExerciseService::new(config);
            let terminal = ratatui::init();
            let result = run_watch_face(terminal, &service, exercise_type).await;
            ratatui::restore();
            if let Some(summary) = result? {
                println!("Exercise Summary\n{}", summary);
            }
            Ok(())
        }
        Commands::Simulate {
            exercise_type,
            ticks,
            pause_after,
            seed,
            json,
        } => {
            env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
            let service = match seed {
                Some(seed) => ExerciseService::with_readings(config, RandomReadings::seeded(seed)),
                None => ExerciseService::new(config),
            };
            simulate(&service, exercise_type, ticks, pause_after, json).await
        }
        Commands::Types => {
            for exercise_type in ExerciseService::new(config).supported_types() {
                println!("{}", exercise_type);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn service_with_warmup(warmup: Duration) -> ExerciseService {
        let config = ExerciseConfig {
            warmup,
            ..Default::default()
        };
        ExerciseService::with_readings(config, RandomReadings::seeded(7))
    }

    async fn exercising_face(service: &ExerciseService) -> WatchFace {
        let mut watch = WatchFace::new(ExerciseType::Running);
        watch.start(service).await;
        sleep(service.config().warmup + Duration::from_millis(100)).await;
        watch.settle_pending(service).await;
        assert!(watch.exercising);
        watch
    }

    #[tokio::test(start_paused = true)]
    async fn settle_pending_waits_for_the_warm_up() {
        let service = service_with_warmup(Duration::from_millis(1000));
        let mut watch = WatchFace::new(ExerciseType::Walking);
        watch.start(&service).await;
        assert!(watch.pending.is_some());

        sleep(Duration::from_millis(500)).await;
        watch.settle_pending(&service).await;
        assert!(watch.pending.is_some());
        assert!(!watch.exercising);

        sleep(Duration::from_millis(600)).await;
        watch.settle_pending(&service).await;
        assert!(watch.pending.is_none());
        assert!(watch.exercising);
        assert_eq!(service.current().await.unwrap().status, ExerciseStatus::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_does_nothing_while_preparing() {
        let service = service_with_warmup(Duration::from_secs(10));
        let mut watch = WatchFace::new(ExerciseType::Running);
        watch.start(&service).await;

        sleep(Duration::from_secs(5)).await;
        watch.tick(&service).await;
        assert_eq!(watch.timer, 0);
        assert!(watch.metrics.is_none());

        watch.cycle_type();
        assert_eq!(watch.exercise_type, ExerciseType::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_stops_while_paused() {
        let service = service_with_warmup(Duration::from_millis(1000));
        let mut watch = exercising_face(&service).await;

        sleep(Duration::from_secs(2)).await;
        watch.tick(&service).await;
        assert_eq!(watch.timer, 2);
        let sampled = watch.metrics.unwrap();
        assert_eq!(service.current().await.unwrap().metrics, sampled);

        watch.toggle_pause(&service).await;
        assert!(watch.paused);
        sleep(Duration::from_secs(6)).await;
        watch.tick(&service).await;
        assert_eq!(watch.timer, 2);
        assert_eq!(watch.metrics, Some(sampled));
        assert_eq!(service.current().await.unwrap().metrics, sampled);

        watch.toggle_pause(&service).await;
        assert!(!watch.paused);
        sleep(Duration::from_secs(1)).await;
        watch.tick(&service).await;
        assert_eq!(watch.timer, 3);
        assert_eq!(watch.metrics, Some(sampled));

        sleep(Duration::from_secs(1)).await;
        watch.tick(&service).await;
        assert_eq!(watch.timer, 4);
        assert_eq!(watch.metrics, Some(service.current().await.unwrap().metrics));
    }

    #[tokio::test(start_paused = true)]
    async fn end_during_warm_up_leaves_the_slot_empty() {
        let service = service_with_warmup(Duration::from_millis(1000));
        let mut watch = WatchFace::new(ExerciseType::Biking);
        watch.start(&service).await;

        watch.end(&service).await;
        assert!(watch.pending.is_none());
        assert!(!watch.exercising);
        assert!(watch.last_summary.is_none());
        assert!(service.current().await.is_none());

        sleep(Duration::from_secs(2)).await;
        assert!(service.current().await.is_none());

        watch.start(&service).await;
        assert!(watch.pending.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn end_keeps_a_summary() {
        let service = service_with_warmup(Duration::from_millis(1000));
        let mut watch = exercising_face(&service).await;
        sleep(Duration::from_secs(4)).await;
        watch.tick(&service).await;

        watch.end(&service).await;
        assert!(!watch.exercising);
        assert_eq!(watch.timer, 0);
        assert!(watch.metrics.is_none());
        let summary = watch.last_summary.unwrap();
        assert_eq!(summary.exercise_type, ExerciseType::Running);
        assert!(summary.active_seconds >= 4);
        assert!(service.current().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn simulate_ends_the_session() {
        let service = service_with_warmup(Duration::from_millis(10));
        simulate(&service, ExerciseType::Swimming, 3, Some(1), true)
            .await
            .unwrap();
        assert!(service.current().await.is_none());
    }
}

use crate::{
    choices::ChoiceList,
    config::Config,
    logging::LogTarget,
    random::RandomSource,
    render::{
        banner::{BannerGenerator, ResultBanner},
        terminal::{TerminalDrawer, TerminalGuard},
        Scene, ScreenLayout,
    },
    wheel::{
        animator::{NoopSampler, SharedRate},
        text_fit::{CellMeasurer, TextMeasurer, Unmeasurable},
        Wheel, WheelEvent, WheelSettings,
    },
};
use anyhow::{anyhow, Context};
use clap::{Parser, ValueHint};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal,
};
use directories::ProjectDirs;
use std::{
    cell::RefCell,
    fs, io,
    path::{Path, PathBuf},
    rc::Rc,
    time::{Duration, Instant},
};
use tracing::{debug, info, trace, warn};

mod choices;
mod config;
mod logging;
mod random;
mod render;
mod wheel;

/// How long to wait for input before drawing the next frame.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Spin a wheel of choices in your terminal.
#[derive(Parser)]
#[command(version, about = "A terminal spinning wheel that picks one of your choices")]
struct Cli {
    /// The choices to put on the wheel.
    choices: Vec<String>,

    /// Read the choices from a file, one per line.
    #[clap(short, long, value_hint = ValueHint::FilePath)]
    file: Option<PathBuf>,

    /// The path to the configuration file.
    #[clap(short, long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Seed the random generator to get repeatable spins.
    #[clap(long)]
    seed: Option<u64>,

    /// Spin once without a user interface and print the result.
    #[clap(short, long)]
    print: bool,

    /// Write logs to this file.
    #[clap(long, value_hint = ValueHint::FilePath)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn log_target(&self) -> LogTarget<'_> {
        match (&self.log_file, self.print) {
            (Some(path), _) => LogTarget::File(path),
            (None, true) => LogTarget::Stderr,
            // the interface owns the screen
            (None, false) => LogTarget::Disabled,
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => match ProjectDirs::from("", "", "wheelspin") {
            Some(dirs) => dirs.config_dir().join("config.yaml"),
            None => {
                debug!("no home directory, using default configuration");
                return Ok(Config::default());
            }
        },
    };
    debug!("loading configuration from {}", path.display());
    Config::load(&path).with_context(|| format!("loading configuration from {}", path.display()))
}

fn load_choices(cli: &Cli, config: &Config) -> anyhow::Result<ChoiceList> {
    if !cli.choices.is_empty() {
        return ChoiceList::new(cli.choices.iter().cloned()).context("invalid choices");
    }
    if let Some(path) = &cli.file {
        return read_choice_file(path);
    }
    if let Some(choices) = config.choices().context("invalid choices in configuration")? {
        return Ok(choices);
    }
    Ok(ChoiceList::default())
}

fn read_choice_file(path: &Path) -> anyhow::Result<ChoiceList> {
    let contents = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    ChoiceList::parse(&contents).with_context(|| format!("invalid choices in {}", path.display()))
}

/// Spin once on a virtual clock and print the winner.
fn run_headless<R: RandomSource>(choices: ChoiceList, settings: WheelSettings, rng: R) -> anyhow::Result<()> {
    // there's nothing to measure text with without a display
    let mut wheel = Wheel::new(choices, settings, rng, Unmeasurable, Box::new(NoopSampler));
    let start = Instant::now();
    wheel.spin(start)?;
    wheel.poll(start + wheel.spin_duration());
    let label = wheel.selected().ok_or_else(|| anyhow!("spin didn't finish"))?;
    println!("{label}");
    Ok(())
}

struct App<R, M> {
    wheel: Wheel<R, M>,
    rate: SharedRate,
    banners: Option<BannerGenerator>,
    banner: Option<ResultBanner>,
    finished: Rc<RefCell<Option<String>>>,
    choice_file: Option<PathBuf>,
}

impl<R, M> App<R, M>
where
    R: RandomSource,
    M: TextMeasurer,
{
    fn new(mut wheel: Wheel<R, M>, rate: SharedRate, choice_file: Option<PathBuf>) -> Self {
        let banners = match BannerGenerator::standard() {
            Ok(generator) => Some(generator),
            Err(e) => {
                warn!("results will be shown as plain text: {e}");
                None
            }
        };
        let finished = Rc::new(RefCell::new(None));
        let sink = finished.clone();
        wheel.on_result(move |_, label| *sink.borrow_mut() = Some(label.to_string()));
        Self { wheel, rate, banners, banner: None, finished, choice_file }
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let _guard = TerminalGuard::enter().context("setting up terminal")?;
        let mut drawer = TerminalDrawer::new(io::stdout());
        loop {
            let now = Instant::now();
            let rotation = match self.wheel.poll(now) {
                WheelEvent::Frame { rotation, progress } => {
                    trace!(rotation, progress, "frame");
                    rotation
                }
                WheelEvent::Finished { index, label } => {
                    debug!(index, label = %label, "showing result");
                    self.wheel.displayed_rotation(now)
                }
                WheelEvent::Idle => self.wheel.displayed_rotation(now),
            };
            let (width, height) = terminal::size()?;
            let layout = ScreenLayout::new(width, height);
            if let Some(label) = self.finished.borrow_mut().take() {
                self.banner = Some(ResultBanner::new(self.banners.as_ref(), &label, layout.panel_width(), now));
            }
            let scene = Scene {
                slices: self.wheel.slices().collect(),
                rotation,
                label_cells: self.wheel.label_cells(),
                rate: self.rate.get(),
                spinning: self.wheel.is_spinning(),
                banner: self.banner.as_ref(),
            };
            drawer.draw(&layout.render(&scene, now))?;

            if !event::poll(FRAME_INTERVAL)? {
                continue;
            }
            let Event::Key(KeyEvent { code, modifiers, kind: KeyEventKind::Press, .. }) = event::read()? else {
                continue;
            };
            match code {
                KeyCode::Enter | KeyCode::Char(' ') => {
                    if self.wheel.spin(Instant::now())? {
                        self.banner = None;
                    }
                }
                KeyCode::Char('r') if !self.wheel.is_spinning() => self.reload(),
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => break,
                _ => (),
            }
        }
        let state = self.wheel.state();
        debug!(rotation = state.rotation, phase = %state.phase, last_group = ?state.last_group, "quitting");
        self.wheel.cancel();
        Ok(())
    }

    /// Reload the choice file if there is one, repainting the wheel either way.
    fn reload(&mut self) {
        let choices = match &self.choice_file {
            Some(path) => match read_choice_file(path) {
                Ok(choices) => choices,
                Err(e) => {
                    warn!("keeping current choices: {e:#}");
                    return;
                }
            },
            None => self.wheel.choices().clone(),
        };
        let count = choices.len();
        if self.wheel.set_choices(choices) {
            info!(count, "reloaded choices");
            self.banner = None;
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    logging::init(cli.log_target())?;
    let config = load_config(&cli)?;
    let choices = load_choices(&cli, &config)?;
    let settings = config.wheel_settings();
    let rng = random::default_source(cli.seed);
    if cli.print {
        return run_headless(choices, settings, rng);
    }

    let rate = SharedRate::default();
    let wheel = Wheel::new(choices, settings, rng, CellMeasurer::default(), Box::new(rate.clone()));
    let choice_file = if cli.choices.is_empty() { cli.file } else { None };
    App::new(wheel, rate, choice_file).run()
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

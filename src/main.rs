use std::path::PathBuf;

use clap::Parser;

use rrrcore::config::RobotConfig;
use rrrcore::control::clock::{Clock, MonotonicClock};
use rrrcore::input::{PanelMapping, TouchCalibration};
use rrrcore::sim::{circle_samples, SimRobot};

/// Runs the drawing robot in simulation, tracing a circle on the touch panel.
#[derive(Parser, Debug)]
#[command(name = "rrr-sim", version)]
struct Args {
    /// Robot configuration file, JSON. The robot as built is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of scheduler ticks to simulate
    #[arg(short, long, default_value_t = 400)]
    ticks: u64,

    /// Circle radius, in inches
    #[arg(short, long, default_value_t = 1.0)]
    radius: f64,

    /// Number of touches around the circle
    #[arg(short, long, default_value_t = 60)]
    samples: usize,

    /// Joint speed at full duty, in degrees per second
    #[arg(long, default_value_t = 360.0)]
    speed: f64,

    /// Run as fast as possible instead of in real time
    #[arg(long)]
    fast: bool,

    /// Log more, repeat for per-tick values
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = match &args.config {
        Some(path) => RobotConfig::load(path)?,
        None => RobotConfig::default(),
    };
    let calibration = config.touch_calibration()?;
    let mapping = config.panel.mapping;

    let schedule = config.schedule;
    let period = schedule.joint_period().min(schedule.brain_period()).min(schedule.touch_period());

    if args.fast {
        let mut robot = SimRobot::new(&config, calibration, args.speed)?;
        press_circle(&robot, &args, &mapping, &calibration);
        tracing::info!(ticks = args.ticks, ?period, touches = robot.touch.remaining(), "Simulation started");

        for tick in 0..args.ticks {
            robot.tick(period);
            trace_tracking(&robot, tick);
        }
        report(&robot);
    } else {
        let clock = MonotonicClock::new();
        let mut robot = SimRobot::with_clock(&config, calibration, args.speed, clock)?;
        press_circle(&robot, &args, &mapping, &calibration);
        tracing::info!(ticks = args.ticks, ?period, touches = robot.touch.remaining(), "Real time simulation started");

        let mut interval = tokio::time::interval(period);
        let mut last = clock.now();
        for tick in 0..args.ticks {
            interval.tick().await;
            let now = clock.now();
            robot.step(now.saturating_sub(last));
            last = now;
            trace_tracking(&robot, tick);
        }
        report(&robot);
    }

    Ok(())
}

/// Scripts one touch per point of the circle, centred under the platform's home position.
fn press_circle<C: Clock + Clone + 'static>(
    robot: &SimRobot<C>,
    args: &Args,
    mapping: &PanelMapping,
    calibration: &TouchCalibration,
) {
    let center = (mapping.offset[0], mapping.offset[1]);
    for (x, y) in circle_samples(args.samples, center, args.radius) {
        if !robot.touch.press_at(x, y, mapping, calibration) {
            tracing::error!("Touch calibration cannot be inverted, no touches scripted");
            break;
        }
    }
}

fn trace_tracking<C: Clock + Clone + 'static>(robot: &SimRobot<C>, tick: u64) {
    if tick % 20 == 0 {
        tracing::debug!(time = ?robot.now(), errors = ?robot.tracking_errors(), "Tracking");
    }
}

fn report<C: Clock + Clone + 'static>(robot: &SimRobot<C>) {
    for (leg, error) in robot.tracking_errors().iter().enumerate() {
        match error {
            Some(error) => tracing::info!("Joint {} final tracking error {:.3} degrees", leg + 1, error),
            None => tracing::warn!("Joint {} never received a setpoint", leg + 1),
        }
    }
    for (name, runs) in robot.run_counts() {
        tracing::info!("Task {} ran {} times", name, runs);
    }
    tracing::info!(pen_down_ticks = robot.pen.downs(), "Simulation finished");
}

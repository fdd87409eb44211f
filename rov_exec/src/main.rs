//! Main rover-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Build the control core and start its periodic tasks:
//!         - IMU sampling and calibration
//!         - Telemetry aggregation
//!         - Safety watchdog
//!         - Actuator output
//!         - SLAM polling
//!     - Main loop:
//!         - Telecommand processing from the script
//!     - Stop all tasks, leaving the motors stopped
//!
//! Equipment is simulated by the `sim_client` module.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use color_eyre::{Report, eyre::WrapErr};
use structopt::StructOpt;

// Internal
use comms_if::tc::TcResponse;
use rov_lib::{
    params::RovExecParams,
    rov_ctrl::RovCtrl,
    sim_client::{LogActuators, LogTmSink, SimCamera, SimImu, SimSlam, SysHostMonitor},
    tasks::{Equipment, TaskSet},
    tc_processor
};
use util::{
    logger::{logger_init, LevelFilter},
    session::{self, Session},
    script_interpreter::{ScriptInterpreter, PendingTcs}
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one script cycle.
const CYCLE_PERIOD_S: f64 = 0.10;

/// Time given to the tasks after the end of the script, so the final
/// commands take effect and are seen in telemetry.
const END_OF_SCRIPT_DWELL_S: f64 = 1.0;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "rov_exec", about = "Rover control executable")]
struct Opts {
    /// Path to the telecommand script to execute
    #[structopt(short, long, parse(from_os_str))]
    script: PathBuf,

    /// Parameter file, relative to $ROVER_SW_ROOT/params
    #[structopt(short, long, default_value = "rov_exec.toml")]
    params: String,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new(
        "rov_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Rover Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opts);

    // ---- LOAD PARAMETERS ----

    let params: RovExecParams = util::params::load(&opts.params)
        .wrap_err("Could not load rov_exec params")?;
    params.are_valid()
        .wrap_err("Invalid rov_exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SOURCE ----

    info!("Loading script from {:?}", opts.script);

    let mut script = ScriptInterpreter::new(&opts.script)
        .wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} TCs\n",
        script.get_duration(),
        script.get_num_tcs()
    );

    // ---- INITIALISE CONTROL ----

    info!("Initialising control core...");

    let ctrl = RovCtrl::new(&params)
        .wrap_err("Failed to initialise the control core")?;

    let tasks = TaskSet::spawn(
        &ctrl,
        Equipment {
            imu: Box::new(SimImu::default()),
            actuators: Box::new(LogActuators::default()),
            tm_sink: Box::new(LogTmSink::default()),
            host: Box::new(SysHostMonitor::default()),
            camera: Some(Box::new(SimCamera::new(true))),
            slam: Some(Box::new(SimSlam::new()))
        },
        &params.cycle
    ).wrap_err("Failed to start the periodic tasks")?;

    info!("Control core initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let script_start_s = session::get_elapsed_seconds();

    loop {
        let cycle_start_instant = Instant::now();

        // ---- TELECOMMAND PROCESSING ----

        match script.get_pending_tcs(session::get_elapsed_seconds() - script_start_s) {
            PendingTcs::None => (),
            PendingTcs::Some(tc_vec) => {
                for tc in tc_vec.iter() {
                    match tc_processor::exec(&ctrl, tc) {
                        TcResponse::Ok => (),
                        r => warn!("TC {:?} not executed: {:?}", tc, r)
                    }
                }
            },
            PendingTcs::EndOfScript => {
                info!("End of TC script reached, stopping");
                break
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
            )
        }
    }

    thread::sleep(Duration::from_secs_f64(END_OF_SCRIPT_DWELL_S));

    // ---- SHUTDOWN ----

    tasks.stop().wrap_err("Error while stopping the periodic tasks")?;

    let final_tm = ctrl.snapshot();
    info!(
        "Final state: motion ({:.1}, {:.1}), gimbal ({:.1}, {:.1}), faults {:?}",
        final_tm.motion.left_speed,
        final_tm.motion.right_speed,
        final_tm.gimbal.pan_angle,
        final_tm.gimbal.tilt_angle,
        final_tm.status.faults
    );

    let trajectory = ctrl.trajectory();
    if let (Some(first), Some(last)) = (trajectory.first(), trajectory.last()) {
        info!(
            "Trajectory of {} poses, net displacement {:.2} m",
            trajectory.len(),
            (last - first).norm()
        );
    }

    info!("End of execution");

    Ok(())
}

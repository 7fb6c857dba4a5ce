use std::sync::{Arc, Mutex};
use std::time::Duration;

use dranik::config::RobotConfig;
use dranik::drive::{Drivetrain, MecanumDrive, MecanumPower};
use dranik::hardware::HardwareError;
use dranik::input::script::{self, Script};
use dranik::input::GamepadFeed;
use dranik::messages::InputHealth;
use dranik::op::{OpSettings, RunState};
use dranik::{registry, Op, OpDescriptor, Outcome, Runtime, RuntimeError};

const EPS: f64 = 1e-9;

fn close(a: MecanumPower, b: [f64; 4]) -> bool {
    a.as_array().iter().zip(b).all(|(x, y)| (x - y).abs() < EPS)
}

// Everything touching the process-wide registration slot stays in this one test
#[test]
fn invoke_requires_a_registered_op() {
    registry::clear();

    let (map, probes) = RobotConfig::default().sim_hardware().unwrap();
    let mut runtime = Runtime::new(map, GamepadFeed::new()).with_settings(OpSettings {
        period: None,
        input_timeout: None,
    });

    let err = runtime.invoke().unwrap_err();
    assert!(matches!(err, RuntimeError::NoRoutineRegistered));
    assert_eq!(runtime.state(), RunState::Idle);
    assert!(probes.iter().all(|(_, p)| p.writes() == 0));

    OpDescriptor::autonomous("spin")
        .bind(|op: &mut Op| -> Result<(), HardwareError> {
            let mut drive = MecanumDrive::new(
                op.dc_motor("motor0")?,
                op.dc_motor("motor1")?,
                op.dc_motor("motor2")?,
                op.dc_motor("motor3")?,
            );
            drive.apply(MecanumDrive::calc(Default::default(), 0.0, 0.5))?;
            Ok(())
        })
        .register()
        .unwrap();

    let report = runtime.invoke().unwrap();
    assert_eq!(report.name, "spin");
    assert_eq!(report.outcome, Outcome::Ok);
    assert_eq!(runtime.state(), RunState::Terminated);
    assert!(registry::registered().is_none());

    // One write from the routine, one from teardown
    for (_, probe) in &probes {
        assert_eq!(probe.writes(), 2);
        assert_eq!(probe.power(), 0.0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scripted_teleop_follows_live_input() {
    let script = Script::from_json(
        r#"[
            { "at_ms": 0,   "state": { "left_stick": { "y": 1.0 } } },
            { "at_ms": 80,  "state": { "left_stick": { "y": 1.0 }, "right_stick": { "x": 0.5 } } },
            { "at_ms": 160, "state": { "buttons": { "b": true } } }
        ]"#,
    )
    .unwrap();

    let (map, _) = RobotConfig::default().sim_hardware().unwrap();
    let feed = GamepadFeed::new();
    let mut runtime = Runtime::new(map, feed.clone()).with_settings(OpSettings {
        period: Some(Duration::from_millis(2)),
        input_timeout: Some(Duration::from_millis(200)),
    });
    let stop = runtime.stop_handle();

    let replay = tokio::spawn(script::replay(
        script,
        feed,
        Duration::from_millis(2),
        stop.clone(),
    ));

    // Give up eventually rather than hang if the script never arrives
    let guard = stop.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        guard.stop();
    });

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&seen);
    let registration = OpDescriptor::teleop("scripted").bind(
        move |op: &mut Op| -> Result<(), HardwareError> {
            let mut drive = MecanumDrive::new(
                op.dc_motor("motor0")?,
                op.dc_motor("motor1")?,
                op.dc_motor("motor2")?,
                op.dc_motor("motor3")?,
            );
            while op.running() {
                if op.input_health() == InputHealth::Ok && op.gamepad().b() {
                    break;
                }
                let pad = *op.gamepad();
                let applied = drive.drive_default(&pad)?;
                if let Ok(mut seen) = recorded.lock() {
                    seen.push(applied);
                }
            }
            drive.stop()
        },
    );

    let report = tokio::task::spawn_blocking(move || runtime.run(registration))
        .await
        .unwrap()
        .unwrap();
    replay.await.unwrap();

    assert!(report.outcome.is_ok());
    assert_eq!(report.state, RunState::Terminated);
    assert!(report.elapsed_ms < 5000, "script never pressed B");

    let seen = seen.lock().unwrap();
    assert!(seen.iter().any(|v| close(*v, [1.0, 1.0, 1.0, 1.0])));
    assert!(seen
        .iter()
        .any(|v| close(*v, [1.0, 1.0 / 3.0, 1.0, 1.0 / 3.0])));
    assert!(seen
        .iter()
        .all(|v| v.as_array().iter().all(|p| p.abs() <= 1.0 + EPS)));
}

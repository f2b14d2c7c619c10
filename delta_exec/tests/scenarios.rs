//! End to end behaviour of the emulator: store operations, runs and the external API.

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use rstest::{fixture, rstest};

use delta_if::{
    api::{ErrorKind, PointSetRequest, RunStatus, ScriptExecuteRequest},
    motion::{GlobalPoint, Pose},
    PinStatus, RegSize,
};
use delta_lib::{store::points::PointRef, DelayMode, DeltaApi, Engine, RobotStore};

#[fixture]
fn engine() -> Engine {
    Engine::new(Arc::new(RobotStore::new()))
}

fn gl_p1() -> GlobalPoint {
    GlobalPoint {
        name: "GL_P1".into(),
        pose: Pose {
            x: 200.0,
            y: 200.0,
            z: -100.0,
            ..Default::default()
        },
        extra: vec![],
    }
}

#[rstest]
fn outputs_are_set_and_idempotent(engine: Engine) {
    let store = engine.store();

    for pin in 1..=12 {
        store.set_output(pin, PinStatus::On).unwrap();
        store.set_output(pin, PinStatus::On).unwrap();
        assert_eq!(store.get_output(pin), Ok(PinStatus::On));
    }
}

#[rstest]
#[case::zero_output(0)]
#[case::past_last_output(13)]
#[case::negative_output(-1)]
fn output_pins_outside_range(engine: Engine, #[case] pin: i64) {
    let err = engine.store().set_output(pin, PinStatus::On).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RangeError);
}

#[rstest]
#[case(0)]
#[case(25)]
fn input_pins_outside_range(engine: Engine, #[case] pin: i64) {
    let err = engine.store().get_input(pin).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RangeError);
}

#[rstest]
#[case::plain_word(0x1000, 12345, RegSize::W, 12345)]
#[case::word_wraps(0x1000, 70000, RegSize::W, 70000 % 65536)]
#[case::word_negative(0x1FFF, -2, RegSize::W, -2)]
#[case::double_word(0x3000, 1_000_000, RegSize::DW, 1_000_000)]
#[case::double_word_wraps(0x3FFE, 1 << 32, RegSize::DW, 0)]
fn register_write_then_read(
    engine: Engine,
    #[case] address: i64,
    #[case] value: i64,
    #[case] size: RegSize,
    #[case] expected: i64,
) {
    let store = engine.store();
    assert_eq!(store.write_register(address, value, size), Ok(expected));
    assert_eq!(store.read_register(address, size), Ok(expected));
}

#[rstest]
#[case(0x0FFF, RegSize::W)]
#[case(0x2000, RegSize::W)]
#[case(0x4000, RegSize::W)]
#[case(0x3FFF, RegSize::DW)]
fn register_addresses_outside_range(
    engine: Engine,
    #[case] address: i64,
    #[case] size: RegSize,
) {
    let err = engine
        .store()
        .write_register(address, 1, size)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RangeError);
}

#[rstest]
fn point_lifecycle(engine: Engine) {
    let store = engine.store();
    store.set_point(1, gl_p1()).unwrap();

    let result = engine.run_script("MovP(1)");
    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.robot_state.position, gl_p1().pose);

    let result = engine.run_script("MovP(999)");
    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.error.unwrap().kind, ErrorKind::NotFound);
    assert_eq!(result.robot_state.position, gl_p1().pose);

    assert_eq!(
        store.get_point(&PointRef::Num(1001)).unwrap_err().kind(),
        ErrorKind::RangeError
    );
}

#[rstest]
fn movp_and_movl_converge(engine: Engine) {
    engine.store().set_point(1, gl_p1()).unwrap();

    let p = engine.run_script("MovP(1)");
    let l = engine.run_script("MovL(\"GL_P1\")");

    assert_eq!(p.robot_state, l.robot_state);
    assert_eq!(p.output, vec!["MovP(1) -> (200.0, 200.0, -100.0)"]);
    assert_eq!(l.output, vec!["MovL(\"GL_P1\") -> (200.0, 200.0, -100.0)"]);
}

#[rstest]
fn failed_run_keeps_prior_effects(engine: Engine) {
    let result = engine.run_script("DO(1,\"ON\")\nDO(99,\"ON\")");

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.output, vec!["DO(1, ON)"]);
    assert_eq!(result.commands_executed, 1);
    assert_eq!(result.robot_state.do_state[&1], PinStatus::On);

    let error = result.error.unwrap();
    assert_eq!(error.kind, ErrorKind::RangeError);
    assert_eq!(error.command_index, Some(1));
    assert_eq!(error.line, Some(2));
}

#[rstest]
#[case::syntax("DO(1, ON)\nif DI(1) then")]
#[case::unsupported("DO(1, ON)\nfunction pick() end")]
#[case::unknown_function("DO(1, ON)\nLaunch()")]
fn script_errors_run_nothing(engine: Engine, #[case] script: &str) {
    let result = engine.run_script(script);

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.error.unwrap().kind, ErrorKind::ScriptError);
    assert!(result.output.is_empty());
    assert_eq!(result.robot_state.do_state[&1], PinStatus::Off);
}

#[rstest]
#[case::wrong_type("MovJ(\"one\", 90)", ErrorKind::InvalidArgument)]
#[case::bad_status("DO(1, \"HIGH\")", ErrorKind::InvalidArgument)]
#[case::bad_item("SetGlobalPoint(1, \"P\", 0, 0, 0)\nReadPoint(1, \"Q\")", ErrorKind::InvalidArgument)]
#[case::bad_joint("MovJ(7, 90)", ErrorKind::RangeError)]
#[case::bad_accuracy("Accur(\"FINE\")", ErrorKind::InvalidArgument)]
#[case::negative_speed("SpdL(-5)", ErrorKind::InvalidArgument)]
#[case::wait("WAIT(\"DO\", 3, ON)", ErrorKind::WaitUnsatisfied)]
fn run_error_kinds(engine: Engine, #[case] script: &str, #[case] kind: ErrorKind) {
    let result = engine.run_script(script);
    assert_eq!(result.error.map(|e| e.kind), Some(kind));
}

#[rstest]
fn wait_observes_driven_inputs(engine: Engine) {
    engine.store().set_input(7, PinStatus::On).unwrap();
    engine
        .store()
        .set_external_input(2, 1, PinStatus::On)
        .unwrap();

    let result = engine.run_script(
        "a = WAIT(\"DI\", 7, ON)\n\
         b = WAIT(\"ExtDI\", 2, 1, ON)\n\
         c = WAIT(\"DI\", 8, ON, 100)\n\
         print(a, b, c, DI(7), DI(1, 8))",
    );

    assert!(result.is_completed());
    assert_eq!(result.output.last().unwrap(), "[PRINT] true true false ON 64");
}

#[rstest]
fn loops_and_conditionals_drive_commands(engine: Engine) {
    let result = engine.run_script("for i = 1, 3 do DO(i, \"ON\") end");
    assert!(result.is_completed(), "{:?}", result.error);
    assert_eq!(result.output, vec!["DO(1, ON)", "DO(2, ON)", "DO(3, ON)"]);
    assert_eq!(result.commands_executed, 3);

    let result = engine.run_script("if DI(1) == \"OFF\" then DO(5, \"ON\") end");
    assert!(result.is_completed(), "{:?}", result.error);
    assert_eq!(result.output, vec!["DO(5, ON)"]);

    let result = engine.run_script("--[[ Pick job\n author: ops ]]\nDO(6,\"ON\")");
    assert!(result.is_completed(), "{:?}", result.error);
    assert_eq!(result.output, vec!["DO(6, ON)"]);

    let outputs = engine.store().output_states();
    assert!([1u32, 2, 3, 5, 6].iter().all(|pin| outputs[pin].is_on()));
    assert!(!outputs[&4].is_on());
}

#[rstest]
fn failure_inside_loop_reports_iteration(engine: Engine) {
    let result = engine.run_script("for pin = 10, 14 do\n  DO(pin, ON)\nend");

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.output, vec!["DO(10, ON)", "DO(11, ON)", "DO(12, ON)"]);

    let error = result.error.unwrap();
    assert_eq!(error.kind, ErrorKind::RangeError);
    assert_eq!(error.command_index, Some(3));
    assert_eq!(error.line, Some(2));
}

#[rstest]
fn external_outputs_set_and_pulse(engine: Engine) {
    let result = engine.run_script(
        "ExtDO(3, 4, ON)\n\
         ExtDO(3, 5, \"on\", 0.25)\n\
         print(WAIT(\"ExtDO\", 3, 4, ON), WAIT(\"ExtDO\", 3, 5, OFF))",
    );

    assert!(result.is_completed(), "{:?}", result.error);
    assert_eq!(
        result.output,
        vec![
            "ExtDO(3, 4, ON)",
            "ExtDO(3, 5, ON)",
            "ExtDO(3, 5, OFF) after delay",
            "WAIT(ExtDO, 3, 4, ON)",
            "WAIT(ExtDO, 3, 5, OFF)",
            "[PRINT] true true",
        ]
    );

    let store = engine.store();
    assert_eq!(store.get_external_output(3, 4), Ok(PinStatus::On));
    assert_eq!(store.get_external_output(3, 5), Ok(PinStatus::Off));

    let result = engine.run_script("ExtDO(-1, 4, ON)");
    assert_eq!(result.error.map(|e| e.kind), Some(ErrorKind::RangeError));

    let result = engine.run_script("ExtDO(3, 6, ON, -1)");
    assert_eq!(result.error.map(|e| e.kind), Some(ErrorKind::InvalidArgument));
    assert_eq!(store.get_external_output(3, 6), Ok(PinStatus::Off));
}

#[rstest]
#[case::delay("DO(1, ON)\nDELAY(0.4)")]
#[case::output_pulse("DO(1, ON, 0.4)")]
#[case::external_pulse("DO(1, ON)\nExtDO(2, 1, ON, 0.4)")]
#[case::wait_timeout("DO(1, ON)\nWAIT(\"DI\", 9, ON, 400)")]
fn sleeping_run_leaves_store_available(#[case] script: &str) {
    let engine = Engine::new(Arc::new(RobotStore::new())).with_delay_mode(DelayMode::Sleep);
    let runner = engine.clone();
    let script = script.to_string();

    let start = Instant::now();
    let handle = thread::spawn(move || runner.run_script(&script));

    // DO1 goes ON just before the run starts sleeping
    while engine.store().get_output(1) != Ok(PinStatus::On) {
        assert!(start.elapsed() < Duration::from_secs(2), "run never set DO1");
        thread::sleep(Duration::from_millis(1));
    }

    let op_start = Instant::now();
    engine.store().set_output(12, PinStatus::On).unwrap();
    engine.store().set_input(10, PinStatus::On).unwrap();
    let snapshot = engine.store().snapshot();
    assert!(op_start.elapsed() < Duration::from_millis(200));
    assert!(!handle.is_finished());
    assert_eq!(snapshot.do_state[&12], PinStatus::On);

    let result = handle.join().unwrap();
    assert!(result.is_completed(), "{:?}", result.error);
    assert!(start.elapsed() >= Duration::from_millis(400));
    assert_eq!(result.robot_state.do_state[&12], PinStatus::On);
}

#[rstest]
fn wait_timeout_sleeps_only_in_sleep_mode(engine: Engine) {
    let script = "r = WAIT(\"DI\", 9, ON, 150)\nprint(r)";
    let expected = vec!["WAIT(DI, 9, ON) timeout after 150.0 ms", "[PRINT] false"];

    let start = Instant::now();
    let recorded = engine.run_script(script);
    assert!(start.elapsed() < Duration::from_millis(150));
    assert_eq!(recorded.output, expected);

    let sleeping = engine.clone().with_delay_mode(DelayMode::Sleep);
    let start = Instant::now();
    let slept = sleeping.run_script(script);
    assert!(start.elapsed() >= Duration::from_millis(150));
    assert!(slept.is_completed());
    assert_eq!(slept.output, expected);
}

#[rstest]
fn concurrent_runs_do_not_lose_updates(engine: Engine) {
    let handles: Vec<_> = (1..=12)
        .map(|pin| {
            let engine = engine.clone();
            thread::spawn(move || {
                let script = format!("DO({pin}, OFF)\nDO({pin}, ON)\nprint(\"done {pin}\")");
                engine.run_script(&script)
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.join().unwrap();
        let pin = i + 1;
        assert!(result.is_completed());
        assert_eq!(
            result.output,
            vec![
                format!("DO({}, OFF)", pin),
                format!("DO({}, ON)", pin),
                format!("[PRINT] done {}", pin),
            ]
        );
    }

    let outputs = engine.store().output_states();
    assert!(outputs.values().all(|s| s.is_on()));
}

#[rstest]
fn end_to_end_script(engine: Engine) {
    let api = DeltaApi::new(engine);

    api.set_point(PointSetRequest {
        point_num: 1,
        name: "GL_P1".into(),
        x: 200.0,
        y: 200.0,
        z: -100.0,
        rx: 0.0,
        ry: 0.0,
        rz: 0.0,
        extra: vec![],
    })
    .unwrap();

    let script = r#"
-- Pick sequence
SpdJ(50)
AccJ(20)
DO(1, "ON")
MovP(1)
WriteModbus(0x1000, "W", 12345)
print("Modbus value: " .. ReadModbus(0x1000, "W"))
"#;

    let result = api.execute_script(&ScriptExecuteRequest {
        script: script.into(),
    });

    assert_eq!(result.status, RunStatus::Completed, "{:?}", result.error);
    assert_eq!(
        result.output,
        vec![
            "SpdJ(50.0%)",
            "AccJ(20.0%)",
            "DO(1, ON)",
            "MovP(1) -> (200.0, 200.0, -100.0)",
            "WriteModbus(0x1000, W, 12345)",
            "ReadModbus(0x1000, W) = 12345",
            "[PRINT] Modbus value: 12345",
        ]
    );
    assert!(result.output.last().unwrap().contains("12345"));
    assert_eq!(result.robot_state.position, gl_p1().pose);
    assert_eq!(result.robot_state.motion_settings.spdj, 50.0);
    assert_eq!(result.robot_state.motion_settings.accj, 20.0);
    assert_eq!(result.commands_executed, 7);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "Completed");
    assert_eq!(json["robot_state"]["do_state"]["1"], "ON");
}

use pantilt::config::RigConfig;
use pantilt::rig::scan_rig;
use pantilt::sim::{SimChip, SimEvent, SimLog, SimPacer};

// Start both, scan in turn until Ctrl-C, clean both up, release the GPIO.
#[test]
fn scans_sequentially_then_cleans_up() {
    let log = SimLog::new();
    // Ctrl-C lands in the second pause of tilt's first scan.
    let pacer = SimPacer::interrupt_after(&log, 6);
    let mut out = Vec::new();

    scan_rig(SimChip::new(&log), &RigConfig::pan_tilt(), pacer, &mut out).unwrap();

    // pan: start, full scan, centre on cleanup
    assert_eq!(log.duty_cycles(5), vec![7.0, 3.0, 7.0, 11.0, 7.0, 7.0]);
    // tilt: start, two phases of its scan, centre on cleanup
    assert_eq!(log.duty_cycles(6), vec![6.5, 2.0, 6.5, 6.5]);

    let events = log.events();
    assert_eq!(events.last(), Some(&SimEvent::ReleaseAll));
    let stops = events
        .iter()
        .filter(|e| match e {
            SimEvent::Stop { .. } => true,
            _ => false,
        })
        .count();
    assert_eq!(stops, 2);

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Servo: pin - 5, MIN_DC - 3.0, MAX_DC - 11.0, DC - 7.0"));
    assert!(out.contains("Servo: pin - 6, MIN_DC - 2.0, MAX_DC - 11.0, DC - 6.5"));
    assert_eq!(out.matches("Scanning (CTRL c to exit)...").count(), 1);
    assert!(out.contains("-- CTRL-C: Terminating program --"));
    assert!(out.ends_with("Done.\n"));
}

#[test]
fn scans_rig_from_json() {
    let rig = RigConfig::from_json(
        r#"{ "pause_ms": 5, "servos": [ { "name": "pan", "pin": 12, "min_duty_cycle": 4, "max_duty_cycle": 8 } ] }"#,
    )
    .unwrap();
    let log = SimLog::new();
    let mut out = Vec::new();

    scan_rig(SimChip::new(&log), &rig, SimPacer::interrupt_after(&log, 4), &mut out).unwrap();

    assert_eq!(log.duty_cycles(12), vec![6.0, 4.0, 6.0, 8.0, 6.0, 6.0]);
    assert_eq!(log.events().last(), Some(&SimEvent::ReleaseAll));
}

// Runs in its own process so the counter starts from zero.

use pantilt::sim::{SimChip, SimLog, SimPacer};
use pantilt::{build_servo, instance_count, Gpio};

#[test]
fn counts_every_servo_created() {
    let log = SimLog::new();
    let mut gpio = Gpio::new(SimChip::new(&log));
    assert_eq!(instance_count(), 0);

    let mut pan = build_servo(&mut gpio, 5, SimPacer::new(&log)).unwrap();
    let tilt = build_servo(&mut gpio, 6, SimPacer::new(&log)).unwrap();
    assert_eq!(instance_count(), 2);

    {
        let _spare = build_servo(&mut gpio, 13, SimPacer::new(&log)).unwrap();
        assert_eq!(instance_count(), 3);
    }
    pan.cleanup().unwrap();
    drop(tilt);
    assert_eq!(instance_count(), 3);

    // A refused allocation is not a servo.
    assert!(build_servo(&mut gpio, 5, SimPacer::new(&log)).is_err());
    assert_eq!(instance_count(), 3);
}

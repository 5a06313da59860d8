use std::sync::Arc;

use gpiofs::{
    Direction, GpioConfig, GpioController, GpioError, GpioPinGroup, MockGateway, PinNumber, Value,
};

const A: PinNumber = PinNumber::Gpio5;
const B: PinNumber = PinNumber::Gpio6;
const C: PinNumber = PinNumber::Gpio13;

fn controller() -> (Arc<MockGateway>, GpioController<MockGateway>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let gateway = Arc::new(MockGateway::default());
    let controller = GpioController::new(Arc::new(GpioConfig::default()), gateway.clone());
    (gateway, controller)
}

#[test]
fn group_exports_members_in_order() {
    let (gateway, ctl) = controller();

    let group = ctl.open_group([A, B, C], Direction::Output).unwrap();

    assert_eq!(group.size(), 3);
    assert_eq!(group.pin_numbers(), vec![A, B, C]);
    assert_eq!(gateway.writes_to(&gateway.export_path()), vec!["5", "6", "13"]);
    assert_eq!(gateway.exported(), vec![5, 6, 13]);
    assert!(group.iter().all(|pin| pin.is_ready()));
}

#[test]
fn failed_member_rolls_back_and_skips_the_rest() {
    let (gateway, ctl) = controller();
    gateway.export_externally(B);

    let err = ctl.open_group([A, B, C], Direction::Output).unwrap_err();
    assert_eq!(err, GpioError::DeviceBusy);

    assert_eq!(gateway.writes_to(&gateway.export_path()), vec!["5", "6"]);
    assert_eq!(gateway.writes_to(&gateway.unexport_path()), vec!["5"]);
    assert_eq!(gateway.write_count(&gateway.direction_path(C)), 0);
    // the external claim on B is left alone
    assert_eq!(gateway.exported(), vec![6]);
}

#[test]
fn set_all_direction_stops_at_first_error() {
    let (gateway, ctl) = controller();
    let mut group = ctl.open_group([A, B, C], Direction::Input).unwrap();
    gateway.fail_writes(gateway.direction_path(B), GpioError::WriteFailed);

    assert_eq!(
        group.set_all_direction(Direction::Output),
        Err(GpioError::InvalidDirection)
    );

    assert_eq!(group.get(0).unwrap().get_direction(), Ok(Direction::Output));
    assert_eq!(gateway.writes_to(&gateway.direction_path(C)), vec!["in"]);
    assert_eq!(group.get(2).unwrap().get_direction(), Ok(Direction::Input));

    gateway.clear_faults();
    assert_eq!(group.set_all_direction(Direction::Output), Ok(()));
}

#[test]
fn set_all_value_stops_at_first_error() {
    let (gateway, ctl) = controller();
    let mut group = ctl.open_group([A, B, C], Direction::Output).unwrap();

    assert_eq!(group.set_all_value(Value::High), Ok(()));
    assert_eq!(group.get_all_values(), Ok(vec![Value::High; 3]));

    gateway.fail_writes(gateway.value_path(B), GpioError::PermissionDenied);
    assert_eq!(
        group.set_all_value(Value::Low),
        Err(GpioError::PermissionDenied)
    );
    gateway.clear_faults();

    assert_eq!(
        group.get_all_values(),
        Ok(vec![Value::Low, Value::High, Value::High])
    );
}

#[test]
fn get_all_values_aborts_on_read_failure() {
    let (gateway, ctl) = controller();
    let group = ctl.open_group([A, B, C], Direction::Input).unwrap();
    gateway.fail_reads(gateway.value_path(C), GpioError::ReadFailed);

    assert_eq!(group.get_all_values(), Err(GpioError::ReadFailed));
}

#[test]
fn toggle_all_flips_every_member() {
    let (gateway, ctl) = controller();
    let mut group = ctl.open_group([A, B], Direction::Output).unwrap();
    group.get_mut(1).unwrap().set_value(Value::High).unwrap();

    assert_eq!(group.toggle_all(), Ok(vec![Value::High, Value::Low]));
    assert_eq!(gateway.writes_to(&gateway.value_path(A)), vec!["1"]);
}

#[test]
fn get_out_of_range_is_none() {
    let (_gateway, ctl) = controller();
    let mut group = ctl.open_group([A, B, C], Direction::Input).unwrap();

    assert_eq!(group.get(0).map(|pin| pin.pin_number()), Some(A));
    assert!(group.get(group.size()).is_none());
    assert!(group.get(usize::MAX).is_none());
    let size = group.size();
    assert!(group.get_mut(size).is_none());
}

#[test]
fn empty_group_is_valid() {
    let (gateway, ctl) = controller();
    let group = ctl
        .open_group(Vec::<PinNumber>::new(), Direction::Input)
        .unwrap();

    assert!(group.is_empty());
    assert_eq!(group.len(), 0);
    assert_eq!(group.get_all_values(), Ok(vec![]));
    assert!(gateway.writes().is_empty());
}

#[test]
fn dropping_group_unexports_every_member() {
    let (gateway, ctl) = controller();
    let group = ctl.open_group([A, B, C], Direction::Output).unwrap();
    drop(group);

    assert_eq!(gateway.writes_to(&gateway.unexport_path()), vec!["5", "6", "13"]);
    assert!(gateway.exported().is_empty());
}

#[test]
fn group_from_raw_numbers() {
    let (gateway, _ctl) = controller();
    let pins = [17u8, 27, 22]
        .into_iter()
        .map(PinNumber::try_from)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    let group = GpioPinGroup::new(
        gateway.clone(),
        &GpioConfig::default(),
        pins,
        Direction::Input,
    )
    .unwrap();
    assert_eq!(group.size(), 3);
    assert_eq!(gateway.exported(), vec![17, 22, 27]);

    assert!(
        [17u8, 99]
            .into_iter()
            .map(PinNumber::try_from)
            .collect::<Result<Vec<_>, _>>()
            .is_err()
    );
}

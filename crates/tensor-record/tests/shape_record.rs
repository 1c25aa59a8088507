use ndarray::{ArrayD, IxDyn};
use tensor_record::{extent, numel, shape_record, KeyedSize, RecordError};

shape_record!(pub struct ProbeSize(ProbeInfo) { a, b });
shape_record!(struct EmptySize(EmptyInfo) {});

#[test]
fn construction_coerces_each_slot() {
    let size = ProbeSize::new((1, 4), vec![1, 5]);
    assert_eq!(size.a, extent((1, 4)));
    assert_eq!(size.b, extent((1, 5)));
    assert_eq!(numel(&size.a), 4);

    let explicit = ProbeSize::new(IxDyn(&[1, 4]), IxDyn(&[1, 5]));
    assert_eq!(size, explicit);
}

#[test]
fn slot_names_follow_the_declaration() {
    assert_eq!(ProbeSize::FIELDS, ["a", "b"]);
    assert!(EmptySize::FIELDS.is_empty());
}

#[test]
fn numel_reduces_each_slot() {
    let size = ProbeSize::new((1, 4), (1, 5));
    assert_eq!(size.numel(), ProbeInfo { a: 4, b: 5 });
}

#[test]
fn extents_list_slots_in_order() {
    let size = ProbeSize::new((2, 3), (4,));
    assert_eq!(size.extents(), vec![&extent((2, 3)), &extent((4,))]);
}

#[test]
fn broadcast_equality_requires_every_slot_to_match() {
    let uniform = ProbeSize::new((1, 4), (1, 4));
    assert!(uniform == extent((1, 4)));
    assert!(extent((1, 4)) == uniform);

    let mixed = ProbeSize::new((1, 4), (1, 5));
    assert!(mixed != extent((1, 4)));
    assert!(extent((1, 4)) != mixed);
}

#[test]
fn same_type_sizes_compare_slot_wise() {
    assert_eq!(ProbeSize::new((1, 4), (1, 5)), ProbeSize::new((1, 4), (1, 5)));
    assert_ne!(ProbeSize::new((1, 4), (1, 5)), ProbeSize::new((1, 4), (1, 6)));
}

#[test]
fn from_keyedtensors_reads_each_value_extent() {
    let a = ArrayD::<f32>::zeros(IxDyn(&[2, 3]));
    let b = ArrayD::<f32>::zeros(IxDyn(&[4]));

    let size = ProbeSize::from_keyedtensors([("a", &a), ("b", &b)])
        .expect("keyed construction from tensors");
    assert_eq!(size, ProbeSize::new((2, 3), (4,)));

    let err = ProbeSize::from_keyedtensors([("a", &a)]).expect_err("missing slot");
    assert_eq!(err, RecordError::MissingField { field: "b" });

    let err =
        ProbeSize::from_keyedtensors([("a", &a), ("c", &b)]).expect_err("unknown slot");
    assert_eq!(err, RecordError::UnexpectedField { field: "c".into() });

    let err =
        ProbeSize::from_keyedtensors([("a", &a), ("a", &b)]).expect_err("repeated slot");
    assert_eq!(err, RecordError::DuplicateField { field: "a".into() });
}

#[test]
fn zero_slot_records_stay_usable() {
    let size = EmptySize::new();
    assert_eq!(size.numel(), EmptyInfo {});
    assert!(size.extents().is_empty());
    // Broadcast comparison over no slots holds vacuously.
    assert!(size == extent((3,)));
}

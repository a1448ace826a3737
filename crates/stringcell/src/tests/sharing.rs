use alloc::vec::Vec;

use crate::{SharedString, StringValue, args};

#[test]
fn a_value_built_by_formatting_can_be_shared_and_read() {
    let mut v = StringValue::new();
    v.append_printf("%s #%d", &args!["item", 12]);
    let mut a = SharedString::new(v);
    let b = a.clone();
    assert!(a.is_shared());
    assert_eq!(a.char_length(), 8);
    assert_eq!(a.char_at(5), '#');
    assert_eq!(b, SharedString::from("item #12"));
}

#[test]
fn copy_on_write_isolates_each_handle() {
    let mut a = SharedString::from("shared text");
    let mut b = a.clone();
    let c = a.clone();

    a.reverse();
    b.make_unique().append_format("%c%d", &args![33, 2]).unwrap();

    assert_eq!(a, SharedString::from("txet derahs"));
    assert_eq!(b, SharedString::from("shared text!2"));
    assert_eq!(c, SharedString::from("shared text"));
}

#[test]
fn substring_of_a_shared_handle_is_independent() {
    let mut a = SharedString::from("a↑b↓c");
    let _peer = a.clone();
    let mut sub = a.substring(1, 3);
    assert!(!sub.is_shared());
    sub.value_mut().append_bytes(b"!");
    assert_eq!(sub, SharedString::from("↑b↓!"));
    assert_eq!(a, SharedString::from("a↑b↓c"));
}

#[test]
fn unique_handles_mutate_without_copying() {
    let mut a = SharedString::from("abc");
    let before = a.value() as *const StringValue;
    a.value_mut().append_bytes(b"def");
    let after = a.value() as *const StringValue;
    assert_eq!(before, after);
    assert_eq!(a, SharedString::from("abcdef"));
}

#[test]
fn shared_reads_do_not_disturb_lazy_state() {
    // A shared handle must not cache counts, since its peers observe the
    // same value.
    let mut a = SharedString::new(StringValue::from_bytes("α and ω".as_bytes()));
    let b = a.clone();
    assert_eq!(a.char_length(), 7);
    assert_eq!(a.char_at(6), 'ω');
    let collected: Vec<char> = b.chars().collect();
    assert_eq!(collected.len(), 7);
    drop(b);
    // Now unique: the same calls may cache.
    assert_eq!(a.char_length(), 7);
    assert_eq!(a.char_at(0), 'α');
}

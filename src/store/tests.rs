use assert_call::{call, CallRecorder};
use rstest::rstest;

use super::*;

fn count_store(initial: i32) -> (Registry, Store<i32>) {
    let r = Registry::new();
    let s = r.sync(SyncConfig::new("count", initial));
    (r, s)
}

#[test]
fn get_initial() {
    let (_r, s) = count_store(10);
    assert_eq!(s.get_value(), 10);
    assert_eq!(s.key(), "count");
}

#[test]
fn update_replace() {
    let (_r, s) = count_store(10);
    s.update(20);
    assert_eq!(s.get_value(), 20);
    s.update(Update::Replace(30));
    assert_eq!(s.get_value(), 30);
    s.set(40);
    assert_eq!(s.get_value(), 40);
}

#[test]
fn update_transform() {
    let (_r, s) = count_store(10);
    s.update(Update::transform(|x: &i32| x + 1));
    assert_eq!(s.get_value(), 11);
    s.update_with(|x| x * 2);
    assert_eq!(s.get_value(), 22);
}

#[test]
fn update_notifies_in_registration_order() {
    let mut cr = CallRecorder::new();
    let (_r, s) = count_store(0);
    let _s0 = s.on_change(|| call!("a"));
    let _s1 = s.on_change(|| call!("b"));
    let _s2 = s.on_change(|| call!("c"));
    s.set(1);
    cr.verify(["a", "b", "c"]);
}

#[test]
fn update_same_value_notifies() {
    let mut cr = CallRecorder::new();
    let (_r, s) = count_store(5);
    let _s = s.on_change(|| call!("changed"));
    s.set(5);
    cr.verify("changed");
    s.update_with(|x| *x);
    cr.verify("changed");
}

#[test]
fn listener_sees_new_value() {
    let mut cr = CallRecorder::new();
    let (_r, s) = count_store(0);
    let _s = s.on_change({
        let s = s.clone();
        move || call!("{}", s.get_value())
    });
    s.set(1);
    s.set(2);
    cr.verify(["1", "2"]);
}

#[test]
fn duplicate_listener_called_once() {
    let mut cr = CallRecorder::new();
    let (r, s) = count_store(0);
    let l = Listener::new(|| call!("l"));
    let _s0 = s.synchronize(&l);
    let _s1 = s.synchronize(&l);
    assert_eq!(r.listener_count("count"), 1);
    s.set(1);
    cr.verify("l");
}

#[test]
fn unsubscribe_stops_notifications() {
    let mut cr = CallRecorder::new();
    let (_r, s) = count_store(0);
    let s0 = s.on_change(|| call!("a"));
    let _s1 = s.on_change(|| call!("b"));
    s0.unsubscribe();
    s0.unsubscribe();
    s.set(1);
    cr.verify("b");
}

#[test]
fn drop_subscription_unsubscribes() {
    let mut cr = CallRecorder::new();
    let (_r, s) = count_store(0);
    drop(s.on_change(|| call!("a")));
    s.set(1);
    cr.verify(());
}

#[test]
fn detached_subscription_stays() {
    let mut cr = CallRecorder::new();
    let (r, s) = count_store(0);
    s.on_change(|| call!("a")).detach();
    s.set(1);
    cr.verify("a");
    assert_eq!(r.listener_count("count"), 1);
}

#[test]
fn reentrant_update_completes_before_outer_fan_out() {
    let mut cr = CallRecorder::new();
    let (_r, s) = count_store(0);
    let _s0 = s.on_change({
        let s = s.clone();
        move || {
            let value = s.get_value();
            call!("first {value}");
            if value == 1 {
                s.set(2);
            }
        }
    });
    let _s1 = s.on_change({
        let s = s.clone();
        move || call!("second {}", s.get_value())
    });
    s.set(1);
    cr.verify(["first 1", "first 2", "second 2", "second 2"]);
    assert_eq!(s.get_value(), 2);
}

#[test]
fn listener_added_during_fan_out_waits_for_next_update() {
    let mut cr = CallRecorder::new();
    let (_r, s) = count_store(0);
    let added = Rc::new(std::cell::RefCell::new(Vec::new()));
    let _s0 = s.on_change({
        let s = s.clone();
        let added = added.clone();
        move || {
            call!("outer");
            added.borrow_mut().push(s.on_change(|| call!("inner")));
        }
    });
    s.set(1);
    cr.verify("outer");
    added.borrow_mut().clear();
}

#[test]
fn listener_removed_during_fan_out_still_called_once() {
    let mut cr = CallRecorder::new();
    let (_r, s) = count_store(0);
    let later = Rc::new(std::cell::RefCell::new(Subscription::empty()));
    let _s0 = s.on_change({
        let later = later.clone();
        move || {
            call!("a");
            later.borrow().unsubscribe();
        }
    });
    *later.borrow_mut() = s.on_change(|| call!("b"));
    s.set(1);
    cr.verify(["a", "b"]);
    s.set(2);
    cr.verify("a");
}

#[test]
fn aliasing_stores_share_listeners() {
    let mut cr = CallRecorder::new();
    let r = Registry::new();
    let a = r.sync(SyncConfig::new("count", 0));
    let b = r.sync(SyncConfig::new("count", 0));
    assert!(a.ptr_eq(&b));
    assert_eq!(a.source_id(), b.source_id());
    let _s = b.on_change(|| call!("b"));
    a.set(3);
    cr.verify("b");
    assert_eq!(b.get_value(), 3);
}

#[rstest]
#[case(1, "cart__1")]
#[case(42, "cart__42")]
#[case(-1, "cart__-1")]
fn sync_with_params_key(#[case] param: i32, #[case] key: &str) {
    let r = Registry::new();
    let carts = r.sync_with_params::<Vec<u32>, i32>(SyncConfig::new("cart", Vec::new()));
    assert_eq!(carts.key_of(&param), key);
    assert_eq!(carts.get(&param).key(), key);
    assert!(r.contains_key(key));
}

#[test]
fn sync_with_params_same_param_same_store() {
    let r = Registry::new();
    let carts = r.sync_with_params::<Vec<u32>, str>(SyncConfig::new("cart", Vec::new()));
    carts.get("alice").set(vec![1]);
    assert_eq!(carts.get("alice").get_value(), vec![1]);
    assert!(carts.get("alice").ptr_eq(&carts.clone().get("alice")));
    assert_eq!(carts.get("bob").get_value(), Vec::<u32>::new());
}

#[test]
fn sync_with_params_by_key_fn() {
    let r = Registry::new();
    let counts = r.sync_with_params_by(SyncConfig::new("count", 0), |p: &(u8, u8)| {
        format!("{}x{}", p.0, p.1)
    });
    let s = counts.get(&(2, 3));
    assert_eq!(s.key(), "count__2x3");
    s.set(6);
    assert_eq!(counts.get(&(2, 3)).get_value(), 6);
}

#[test]
fn sync_with_params_type_mismatch() {
    let r = Registry::new();
    let _s = r.sync(SyncConfig::new("cart__1", "occupied"));
    let carts = r.sync_with_params::<Vec<u32>, i32>(SyncConfig::new("cart", Vec::new()));
    assert!(matches!(
        carts.try_get(&1),
        Err(StoreError::TypeMismatch { .. })
    ));
}

#[test]
fn serialize() {
    let (_r, s) = count_store(7);
    assert_eq!(serde_json::to_string(&s).unwrap(), "7");
}

#[test]
fn debug() {
    let (_r, s) = count_store(7);
    assert_eq!(format!("{s:?}"), r#"Store { key: "count", value: 7 }"#);
    assert_eq!(format!("{:?}", Update::Replace(1)), "Replace(1)");
}

#[test]
fn transform_may_write_own_store() {
    let mut cr = CallRecorder::new();
    let (_r, s) = count_store(1);
    let _s = s.on_change({
        let s = s.clone();
        move || call!("{}", s.get_value())
    });
    s.update(Update::transform({
        let s = s.clone();
        move |prev: &i32| {
            s.set(prev + 10);
            prev + 100
        }
    }));
    cr.verify(["11", "101"]);
    assert_eq!(s.get_value(), 101);
}

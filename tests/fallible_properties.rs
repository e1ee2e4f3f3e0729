//! Property tests for the `Fallible` combinators.

use std::cell::Cell;

use activation::{Fallible, LicenseErrorKind};
use proptest::prelude::*;

fn arb_kind() -> impl Strategy<Value = LicenseErrorKind> {
    prop_oneof![
        Just(LicenseErrorKind::NoLicenseKey),
        Just(LicenseErrorKind::NoActivation),
        Just(LicenseErrorKind::ParseFailed),
        Just(LicenseErrorKind::DecodeFailed),
        Just(LicenseErrorKind::NoServerConnection),
        Just(LicenseErrorKind::InvalidActivationTime),
        Just(LicenseErrorKind::Unknown),
    ]
}

fn arb_fallible() -> impl Strategy<Value = Fallible<i64, LicenseErrorKind>> {
    prop_oneof![
        any::<i64>().prop_map(Fallible::success),
        arb_kind().prop_map(Fallible::failure),
    ]
}

/// A step that fails on multiples of `n`.
fn step(n: i64, reason: LicenseErrorKind) -> impl Fn(i64) -> Fallible<i64, LicenseErrorKind> {
    move |v| {
        if v % n == 0 {
            Fallible::failure(reason)
        } else {
            Fallible::success(v.wrapping_add(n))
        }
    }
}

proptest! {
    #[test]
    fn map_never_runs_on_failure(reason in arb_kind()) {
        let calls = Cell::new(0);
        let mapped = Fallible::<i64, _>::failure(reason).map(|v| {
            calls.set(calls.get() + 1);
            v + 1
        });

        prop_assert_eq!(calls.get(), 0);
        prop_assert_eq!(mapped, Fallible::failure(reason));
    }

    #[test]
    fn map_identity(f in arb_fallible()) {
        prop_assert_eq!(f.clone().map(|v| v), f);
    }

    #[test]
    fn flat_map_is_associative(
        f in arb_fallible(),
        a in 2i64..7,
        b in 2i64..7,
        ra in arb_kind(),
        rb in arb_kind(),
    ) {
        let left = f.clone().flat_map(step(a, ra)).flat_map(step(b, rb));
        let right = f.flat_map(|v| step(a, ra)(v).flat_map(step(b, rb)));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn flat_map_left_identity(v in any::<i64>(), n in 2i64..7, reason in arb_kind()) {
        prop_assert_eq!(Fallible::success(v).flat_map(step(n, reason)), step(n, reason)(v));
    }

    #[test]
    fn from_option_matches_presence(value in proptest::option::of(any::<i64>()), reason in arb_kind()) {
        let f = Fallible::from_option(value, reason);
        prop_assert_eq!(f.has_value(), value.is_some());
        match value {
            Some(v) => prop_assert_eq!(f, Fallible::success(v)),
            None => prop_assert_eq!(f, Fallible::failure(reason)),
        }
    }

    #[test]
    fn filter_accepting_everything_is_identity(f in arb_fallible(), reason in arb_kind()) {
        prop_assert_eq!(f.clone().filter(|_| true, reason), f);
    }

    #[test]
    fn filter_rejecting_success_uses_given_reason(v in any::<i64>(), reason in arb_kind()) {
        prop_assert_eq!(Fallible::success(v).filter(|_| false, reason), Fallible::failure(reason));
    }

    #[test]
    fn exists_implies_has_value(f in arb_fallible()) {
        if f.exists(|_| true) {
            prop_assert!(f.has_value());
        }
        prop_assert!(!f.exists(|_| false));
    }

    #[test]
    fn value_or_keeps_success(v in any::<i64>(), other in arb_fallible()) {
        prop_assert_eq!(Fallible::success(v).value_or(|_| other), Fallible::success(v));
    }

    #[test]
    fn result_conversion_round_trips(f in arb_fallible()) {
        let back: Fallible<i64, LicenseErrorKind> = f.clone().into_result().into();
        prop_assert_eq!(back, f);
    }
}

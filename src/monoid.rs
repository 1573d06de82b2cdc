//! Monoids used to aggregate per-vertex values over a component.

use std::fmt::Debug;
use std::marker::PhantomData;
use std::ops::Add;

/// An associative operation with an identity element.
///
/// Implementations must satisfy `operate(identity(), x) == x == operate(x, identity())` and
/// `operate(a, operate(b, c)) == operate(operate(a, b), c)`. This is not checked; violating it
/// gives meaningless aggregates.
///
/// Components are aggregated in Euler tour order, which is arbitrary, so a non-commutative
/// operation only gives well defined component aggregates when the caller doesn't depend on order.
pub trait MonoidOperator {
    type Value: Debug + Clone;
    fn identity() -> Self::Value;
    fn operate(a: &Self::Value, b: &Self::Value) -> Self::Value;
}

/// No values at all, for pure connectivity.
impl MonoidOperator for () {
    type Value = ();
    fn identity() -> Self::Value {}
    fn operate(_: &Self::Value, _: &Self::Value) -> Self::Value {}
}

/// Sum, with `T::default()` as the identity.
#[derive(Debug)]
pub struct Additive<T>(PhantomData<T>);

impl<T> MonoidOperator for Additive<T>
where
    T: Debug + Clone + Default + Add<Output = T>,
{
    type Value = T;
    fn identity() -> T {
        T::default()
    }
    fn operate(a: &T, b: &T) -> T {
        a.clone() + b.clone()
    }
}

/// Types with a smallest and a largest value.
pub trait Bounded {
    const MIN: Self;
    const MAX: Self;
}

macro_rules! impl_bounded {
    ($($t:ty),*) => {
        $(impl Bounded for $t {
            const MIN: Self = <$t>::MIN;
            const MAX: Self = <$t>::MAX;
        })*
    };
}

impl_bounded!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

/// Minimum, with `T::MAX` as the identity.
#[derive(Debug)]
pub struct Min<T>(PhantomData<T>);

impl<T> MonoidOperator for Min<T>
where
    T: Debug + Clone + Ord + Bounded,
{
    type Value = T;
    fn identity() -> T {
        T::MAX
    }
    fn operate(a: &T, b: &T) -> T {
        a.min(b).clone()
    }
}

/// Maximum, with `T::MIN` as the identity.
#[derive(Debug)]
pub struct Max<T>(PhantomData<T>);

impl<T> MonoidOperator for Max<T>
where
    T: Debug + Clone + Ord + Bounded,
{
    type Value = T;
    fn identity() -> T {
        T::MIN
    }
    fn operate(a: &T, b: &T) -> T {
        a.max(b).clone()
    }
}

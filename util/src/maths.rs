//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Limit a value to the closed range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float
{
    let mut ret = value;

    if ret > max {
        ret = max
    }
    if ret < min {
        ret = min
    }

    ret
}

/// Zero any value whose magnitude is strictly below `deadzone`.
pub fn apply_deadzone<T>(value: T, deadzone: T) -> T
where
    T: Float
{
    if value.abs() < deadzone {
        T::zero()
    }
    else {
        value
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(150f64, -100f64, 100f64), 100f64);
        assert_eq!(clamp(-150f64, -100f64, 100f64), -100f64);
        assert_eq!(clamp(42f64, -100f64, 100f64), 42f64);
    }

    #[test]
    fn test_apply_deadzone() {
        assert_eq!(apply_deadzone(0.04f64, 0.05), 0.0);
        assert_eq!(apply_deadzone(-0.049f64, 0.05), 0.0);
        assert_eq!(apply_deadzone(0.05f64, 0.05), 0.05);
        assert_eq!(apply_deadzone(-0.8f64, 0.05), -0.8);
    }
}

/// Advance `v` by one Collatz step.
///
/// `1` is treated as an absorbing fixed point instead of entering the `1 -> 4 -> 2 -> 1` cycle.
/// `0` maps to itself; callers never track it.
/// Returns `None` when `3v + 1` does not fit in a `u64`.
#[inline]
pub fn collatz_step(v: u64) -> Option<u64> {
    if v == 1 {
        Some(1)
    } else if v.is_multiple_of(2) {
        Some(v / 2)
    } else {
        v.checked_mul(3).and_then(|x| x.checked_add(1))
    }
}

/// Apply [`collatz_step`] elementwise, producing the next generation.
///
/// `None` if any value overflows.
pub fn next_generation(values: &[u64]) -> Option<Vec<u64>> {
    values.iter().map(|&v| collatz_step(v)).collect()
}

/// Number of steps `start` needs to reach 1.
///
/// Returns `None` for `0`, which never reaches the fixed point, and for starts whose
/// trajectory leaves the `u64` range.
pub fn stopping_time(start: u64) -> Option<u64> {
    if start == 0 {
        return None;
    }
    let mut v = start;
    let mut steps = 0u64;
    while v != 1 {
        v = collatz_step(v)?;
        steps += 1;
    }
    Some(steps)
}

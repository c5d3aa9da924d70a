//! Critical Values
//!
//! Two-tailed 95% Student's t critical values, keyed by whole degrees of
//! freedom. The table is dense up to 40 and then sparse; a sparse gap uses
//! the row below it, which is the wider interval. Degrees of freedom past
//! the last row fall back to the normal distribution's z-value.

/// z-value used once the degrees of freedom leave the table
pub const Z_CRITICAL: f64 = 1.96;

/// `T_TABLE[df - 1]` is the critical value for `df` degrees of freedom.
const T_TABLE: [f64; 40] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, // 1-10
    2.201, 2.179, 2.16, 2.145, 2.131, 2.12, 2.11, 2.101, 2.093, 2.086, // 11-20
    2.08, 2.074, 2.069, 2.064, 2.06, 2.056, 2.052, 2.048, 2.045, 2.042, // 21-30
    2.04, 2.037, 2.035, 2.032, 2.03, 2.028, 2.026, 2.024, 2.023, 2.021, // 31-40
];

/// Rows past the dense table, ascending by degrees of freedom.
const T_ROWS: [(usize, f64); 9] = [
    (40, 2.021),
    (50, 2.009),
    (60, 2.0),
    (80, 1.99),
    (100, 1.984),
    (120, 1.98),
    (200, 1.972),
    (500, 1.965),
    (1000, 1.962),
];

/// Look up the critical value for `df` degrees of freedom.
///
/// `df` is rounded to the nearest integer; zero is treated as one so a
/// single-sample phase still reports a (finite) critical value.
pub fn critical_value(df: f64) -> f64 {
    let key = match df.round() {
        k if k.is_nan() || k < 1.0 => 1,
        k => k as usize,
    };

    if let Some(t) = T_TABLE.get(key - 1) {
        return *t;
    }
    if key > T_ROWS[T_ROWS.len() - 1].0 {
        return Z_CRITICAL;
    }
    T_ROWS
        .iter()
        .rev()
        .find(|(row, _)| *row <= key)
        .map_or(Z_CRITICAL, |(_, t)| *t)
}

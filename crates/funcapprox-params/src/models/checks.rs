use crate::error::{ParamsError, Result};

/// Every value must be finite. Archives store plain numbers, so NaN and
/// infinities could not be read back.
pub(crate) fn ensure_finite<'a, I>(what: &str, values: I) -> Result<()>
where
    I: IntoIterator<Item = &'a f64>,
{
    match values.into_iter().position(|v| !v.is_finite()) {
        Some(idx) => Err(ParamsError::value(
            what,
            format!("entry {} is not finite", idx),
        )),
        None => Ok(()),
    }
}

/// Kernel widths and length scales divide the distance to the center.
pub(crate) fn ensure_positive<'a, I>(what: &str, values: I) -> Result<()>
where
    I: IntoIterator<Item = &'a f64>,
{
    for (idx, v) in values.into_iter().enumerate() {
        if !v.is_finite() {
            return Err(ParamsError::value(what, format!("entry {} is not finite", idx)));
        }
        if *v <= 0.0 {
            return Err(ParamsError::value(
                what,
                format!("entry {} is {}, must be > 0", idx, v),
            ));
        }
    }
    Ok(())
}

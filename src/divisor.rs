//! Baud-rate divisor calculation for the fractional baud-rate generator.
//!
//! The generator divides the peripheral clock by
//! `16 x latch x (1 + DIVADDVAL / MULVAL)`, where `latch` is the 16-bit
//! divisor latch (DLM:DLL) and the fractional stage scales it by a rational
//! factor. The hardware constrains `1 <= MULVAL <= 15` and
//! `0 <= DIVADDVAL < MULVAL`; `MULVAL = 1, DIVADDVAL = 0` leaves the
//! fractional stage disabled and the clock passes straight through.
//!
//! The search is exhaustive over all 120 multiplier/addend pairs. It runs once
//! per instance at bring-up, so determinism and reproducibility matter more
//! than speed: everything is integer arithmetic, and error comparisons
//! cross-multiply exact fractions rather than rounding.

use crate::{Error, Result};
use log::debug;

const MULVAL_MAX: u32 = 15;
const LATCH_MAX: u64 = 0xffff;

/// Default margin, in parts per million of relative baud error, by which the
/// fractional stage must beat the plain integer divisor before it is enabled.
///
/// Leaving the fractional stage disabled is cheaper and behaves identically
/// across chip revisions, so a fractional setting that is less than 0.5%
/// closer to the target is not considered worth it. Tune through
/// [`Divisor::compute_with_preference`] if a board needs a different trade.
pub const DEFAULT_INTEGER_PREFERENCE_PPM: u32 = 5_000;

/// A best-fit setting for the baud-rate generator.
///
/// A transient artifact of bring-up: it is written to the divisor registers
/// and not retained afterwards.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Divisor {
    latch: u16,
    mulval: u8,
    divaddval: u8,
    error_ppm: i32,
}

impl Divisor {
    /// Finds the divisor setting whose achieved baud rate is closest to
    /// `baud`, with the default preference for integer-only settings.
    ///
    /// Returns [`Error::UnreachableBaudRate`] when `baud` exceeds
    /// `clock_hz / 16` (the fastest rate the generator can produce), or when
    /// every in-range latch value overshoots 16 bits because the requested
    /// rate is too slow for the clock. Inexact rates are never an error; the
    /// closest achievable setting wins.
    pub fn compute(clock_hz: u32, baud: u32) -> Result<Self> {
        Self::compute_with_preference(clock_hz, baud, DEFAULT_INTEGER_PREFERENCE_PPM)
    }

    /// As [`Divisor::compute`], with an explicit integer-preference margin.
    ///
    /// The integer-only setting (`MULVAL = 1, DIVADDVAL = 0`) is returned
    /// whenever its relative error is within `integer_preference_ppm` of the
    /// best candidate's; a margin of zero always takes the closest setting.
    pub fn compute_with_preference(
        clock_hz: u32,
        baud: u32,
        integer_preference_ppm: u32,
    ) -> Result<Self> {
        if clock_hz == 0 || baud == 0 {
            return Err(Error::InvalidParameter);
        }
        if u64::from(baud) * 16 > u64::from(clock_hz) {
            return Err(Error::UnreachableBaudRate { clock_hz, baud });
        }

        let mut best: Option<Candidate> = None;
        let mut integer_only: Option<Candidate> = None;
        for mulval in 1..=MULVAL_MAX {
            for divaddval in 0..mulval {
                let Some(candidate) = Candidate::new(clock_hz, baud, mulval, divaddval) else {
                    continue;
                };
                if mulval == 1 {
                    integer_only = Some(candidate);
                }
                if best.map_or(true, |b| candidate.closer_than(&b)) {
                    best = Some(candidate);
                }
            }
        }
        let best = best.ok_or(Error::UnreachableBaudRate { clock_hz, baud })?;

        let chosen = match integer_only {
            Some(integer)
                if integer.error_ppm().unsigned_abs()
                    <= best
                        .error_ppm()
                        .unsigned_abs()
                        .saturating_add(integer_preference_ppm) =>
            {
                integer
            }
            _ => best,
        };
        let divisor = chosen.into_divisor();
        debug!(
            "baud {} from {} Hz: latch {} mulval {} divaddval {} ({} ppm off target)",
            baud, clock_hz, divisor.latch, divisor.mulval, divisor.divaddval, divisor.error_ppm
        );
        Ok(divisor)
    }

    /// The 16-bit divisor latch.
    pub fn latch(&self) -> u16 {
        self.latch
    }

    /// High byte of the divisor latch, for the DLM register.
    pub fn dlm(&self) -> u8 {
        (self.latch >> 8) as u8
    }

    /// Low byte of the divisor latch, for the DLL register.
    pub fn dll(&self) -> u8 {
        self.latch as u8
    }

    /// The fractional multiplier, 1 to 15.
    pub fn mulval(&self) -> u8 {
        self.mulval
    }

    /// The fractional addend, 0 to 14 and always below the multiplier.
    pub fn divaddval(&self) -> u8 {
        self.divaddval
    }

    /// Signed relative error of the achieved baud rate, in parts per million
    /// of the target (positive when the achieved rate is above it).
    pub fn error_ppm(&self) -> i32 {
        self.error_ppm
    }

    /// The baud rate this setting actually produces from the given clock.
    pub fn actual_baud(&self, clock_hz: u32) -> u32 {
        let num = u64::from(clock_hz) * u64::from(self.mulval);
        let den = 16 * u64::from(self.latch) * u64::from(self.mulval + self.divaddval);
        (num / den) as u32
    }

    /// The fractional divider register word: multiplier in the high nibble,
    /// addend in the low nibble.
    pub(crate) fn fdr_word(&self) -> u32 {
        (u32::from(self.mulval) << 4) | u32::from(self.divaddval)
    }
}

/// One multiplier/addend pair with its rounded latch and exact error fraction.
#[derive(Copy, Clone, Debug)]
struct Candidate {
    latch: u16,
    mulval: u8,
    divaddval: u8,
    /// `|achieved - target|` as a fraction over `err_den`, kept exact.
    err_num: u64,
    err_den: u64,
    /// The achieved rate is above the target.
    high: bool,
}

impl Candidate {
    /// Rounds the ideal latch for this pair to the nearest integer, or `None`
    /// if it leaves the 16-bit range (including rounding to zero).
    fn new(clock_hz: u32, baud: u32, mulval: u32, divaddval: u32) -> Option<Self> {
        let num = u64::from(clock_hz) * u64::from(mulval);
        let den = 16 * u64::from(baud) * u64::from(mulval + divaddval);
        let latch = (num + den / 2) / den;
        if latch == 0 || latch > LATCH_MAX {
            return None;
        }
        // achieved = num / (16 * latch * (mulval + divaddval)), exactly.
        let achieved_den = 16 * latch * u64::from(mulval + divaddval);
        let target = u64::from(baud) * achieved_den;
        Some(Self {
            latch: latch as u16,
            mulval: mulval as u8,
            divaddval: divaddval as u8,
            err_num: num.abs_diff(target),
            err_den: target,
            high: num > target,
        })
    }

    /// Strictly smaller relative error than `other`. Ties keep the earlier
    /// candidate, so the ascending search order settles them on the smaller
    /// multiplier.
    fn closer_than(&self, other: &Self) -> bool {
        u128::from(self.err_num) * u128::from(other.err_den)
            < u128::from(other.err_num) * u128::from(self.err_den)
    }

    fn error_ppm(&self) -> i32 {
        let magnitude = (u128::from(self.err_num) * 1_000_000 / u128::from(self.err_den)) as i32;
        if self.high {
            magnitude
        } else {
            -magnitude
        }
    }

    fn into_divisor(self) -> Divisor {
        Divisor {
            latch: self.latch,
            mulval: self.mulval,
            divaddval: self.divaddval,
            error_ppm: self.error_ppm(),
        }
    }
}

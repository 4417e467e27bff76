#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sats {
    pub sats: u64,
    pub msats: u64,
}

impl Sats {
    pub const fn new(sats: u64) -> Sats {
        Sats {
            sats,
            msats: sats * 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Msats {
    pub msats: u64,
}

impl Msats {
    pub fn sats_round_up(&self) -> Sats {
        Sats::new(round(self.msats, Rounding::Up))
    }

    pub fn sats_round_down(&self) -> Sats {
        Sats::new(round(self.msats, Rounding::Down))
    }
}

#[allow(clippy::wrong_self_convention)]
pub trait AsSats {
    fn as_sats(self) -> Sats;
    fn as_msats(self) -> Msats;
}

impl AsSats for u64 {
    fn as_sats(self) -> Sats {
        Sats::new(self)
    }
    fn as_msats(self) -> Msats {
        Msats { msats: self }
    }
}

impl AsSats for u32 {
    fn as_sats(self) -> Sats {
        Sats::new(self as u64)
    }
    fn as_msats(self) -> Msats {
        Msats { msats: self as u64 }
    }
}

/// A fee ceiling expressed in basis points (1/100th of a percent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permyriad(pub u32);

impl Permyriad {
    pub fn of(&self, msats: &Msats) -> Msats {
        Msats {
            msats: msats.msats * (self.0 as u64) / 10_000,
        }
    }

    pub fn to_percentage(&self) -> f64 {
        (self.0 as f64) / 100_f64
    }
}

#[derive(Copy, Clone)]
enum Rounding {
    Up,
    Down,
}

fn round(msat: u64, rounding: Rounding) -> u64 {
    match rounding {
        Rounding::Up => (msat + 999) / 1_000,
        Rounding::Down => msat / 1_000,
    }
}

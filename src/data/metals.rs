//! Static table of the precious metals served by the spot price provider

/// A recognized metal code and its display name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metal {
    /// ISO 4217 style metal code
    pub code: &'static str,
    /// Human-readable name shown in quotes
    pub name: &'static str,
}

/// Metals routed to the spot price provider instead of the equity provider
pub static METALS: [Metal; 5] = [
    Metal {
        code: "XAU",
        name: "Spot Gold",
    },
    Metal {
        code: "XAG",
        name: "Spot Silver",
    },
    Metal {
        code: "XPT",
        name: "Spot Platinum",
    },
    Metal {
        code: "XPD",
        name: "Spot Palladium",
    },
    Metal {
        code: "XRH",
        name: "Spot Rhodium",
    },
];

/// Finds a metal by its code
pub fn get_metal(code: &str) -> Option<&'static Metal> {
    METALS.iter().find(|metal| metal.code == code)
}

/// Whether `symbol` is one of the recognized metal codes
pub fn is_metal(symbol: &str) -> bool {
    get_metal(symbol).is_some()
}

/// Display name for a metal code
pub fn metal_name(code: &str) -> Option<&'static str> {
    get_metal(code).map(|metal| metal.name)
}

/// Colour themes for the four DMG shades, lightest first, as 0x00RRGGBB.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ThemeId {
    #[default]
    Classic,
    Retro,
    Pocket,
    IceBlue,
    Amber,
    Sepia,
    PurpleNight,
    CottonCandy,
    OceanDeep,
    ForestHike,
    DesertSand,
    Lava,
    Matrix,
}

struct Theme {
    id: ThemeId,
    name: &'static str,
    shades: [u32; 4],
}

const THEMES: [Theme; 13] = [
    Theme {
        id: ThemeId::Classic,
        name: "classic",
        shades: [0x009BBC0F, 0x008BAC0F, 0x00306230, 0x000F380F],
    },
    Theme {
        id: ThemeId::Retro,
        name: "retro",
        shades: [0x00EFDBB2, 0x00A7997D, 0x00605847, 0x00181612],
    },
    Theme {
        id: ThemeId::Pocket,
        name: "pocket",
        shades: [0x00F8F8F8, 0x00A8A8A8, 0x00505050, 0x00101010],
    },
    Theme {
        id: ThemeId::IceBlue,
        name: "ice-blue",
        shades: [0x00EAF6FF, 0x00A7D8FF, 0x002F6FA3, 0x000B1F33],
    },
    Theme {
        id: ThemeId::Amber,
        name: "amber",
        shades: [0x00FFF4D6, 0x00FFC46B, 0x00C46A00, 0x003A1C00],
    },
    Theme {
        id: ThemeId::Sepia,
        name: "sepia",
        shades: [0x00F3E9D2, 0x00D6C19B, 0x008B6F47, 0x002B1E12],
    },
    Theme {
        id: ThemeId::PurpleNight,
        name: "purple-night",
        shades: [0x00F2E9FF, 0x00BFA6FF, 0x005A2E9C, 0x001B062F],
    },
    Theme {
        id: ThemeId::CottonCandy,
        name: "cotton-candy",
        shades: [0x00FFF1F7, 0x00FFB3D9, 0x008AD7FF, 0x002E4B73],
    },
    Theme {
        id: ThemeId::OceanDeep,
        name: "ocean-deep",
        shades: [0x00D8FFF6, 0x006FE7D1, 0x00178F86, 0x00053B3A],
    },
    Theme {
        id: ThemeId::ForestHike,
        name: "forest-hike",
        shades: [0x00E8F4D9, 0x009CCB6B, 0x003E7A3B, 0x00162A19],
    },
    Theme {
        id: ThemeId::DesertSand,
        name: "desert-sand",
        shades: [0x00FFF2D5, 0x00E6C38F, 0x00B07B3F, 0x003D2412],
    },
    Theme {
        id: ThemeId::Lava,
        name: "lava",
        shades: [0x00FFE6E0, 0x00FF7A3D, 0x00B31212, 0x00240008],
    },
    Theme {
        id: ThemeId::Matrix,
        name: "matrix",
        shades: [0x00D7FFD7, 0x006CFF6C, 0x0000A800, 0x00002300],
    },
];

impl ThemeId {
    #[inline]
    fn entry(self) -> &'static Theme {
        &THEMES[self as usize]
    }

    /// RGB for a DMG shade (0 = lightest, 3 = darkest).
    #[inline]
    pub fn shade(self, shade: u8) -> u32 {
        self.entry().shades[(shade & 0x03) as usize]
    }

    pub fn shades(self) -> [u32; 4] {
        self.entry().shades
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    /// Next theme in the rotation, wrapping back to the first.
    pub fn next(self) -> ThemeId {
        THEMES[(self as usize + 1) % THEMES.len()].id
    }

    /// Case-insensitive lookup; `_` and ` ` are accepted in place of `-`.
    pub fn from_name(name: &str) -> Option<ThemeId> {
        let wanted: String = name
            .trim()
            .chars()
            .map(|c| match c {
                '_' | ' ' => '-',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        THEMES.iter().find(|t| t.name == wanted).map(|t| t.id)
    }

    pub fn all() -> impl Iterator<Item = ThemeId> {
        THEMES.iter().map(|t| t.id)
    }
}

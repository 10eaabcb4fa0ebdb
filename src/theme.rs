use crossterm::style::Color;

pub struct Theme {
    pub primary: Color, // Blue
    pub comment: Color, // Grey
    pub error: Color,   // Red
}

pub const DEFAULT_THEME: Theme = Theme {
    primary: Color::Rgb {
        r: 137,
        g: 180,
        b: 250,
    },
    comment: Color::Rgb {
        r: 108,
        g: 112,
        b: 134,
    },
    error: Color::Rgb {
        r: 243,
        g: 139,
        b: 168,
    },
};

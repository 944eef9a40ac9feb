//! Plotters backend wrapper that survives a broken system font stack.
//!
//! When the wrapped backend panics while drawing text, the text is drawn again
//! with a small built-in bitmap font covering what the Syracuse charts print:
//! digits, the title and the axis labels.

use std::panic;

use plotters_backend::{
    text_anchor, BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend,
    DrawingErrorKind,
};

const GLYPH_HEIGHT: usize = 7;
const SPACE_WIDTH: i32 = 3;

#[derive(Clone, Copy)]
struct Glyph {
    width: u8,
    rows: [u8; GLYPH_HEIGHT],
}

const fn wide(rows: [u8; GLYPH_HEIGHT]) -> Glyph {
    Glyph { width: 5, rows }
}

const GLYPHS: &[(char, Glyph)] = &[
    ('0', wide([0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110])),
    ('1', wide([0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110])),
    ('2', wide([0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111])),
    ('3', wide([0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110])),
    ('4', wide([0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010])),
    ('5', wide([0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110])),
    ('6', wide([0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110])),
    ('7', wide([0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000])),
    ('8', wide([0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110])),
    ('9', wide([0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100])),
    ('A', wide([0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001])),
    ('C', wide([0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110])),
    ('E', wide([0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111])),
    ('N', wide([0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001])),
    ('R', wide([0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001])),
    ('S', wide([0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110])),
    ('U', wide([0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110])),
    ('X', wide([0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001])),
    ('Y', wide([0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100])),
    ('=', wide([0b00000, 0b00000, 0b11111, 0b00000, 0b11111, 0b00000, 0b00000])),
    (
        '(',
        Glyph {
            width: 3,
            rows: [0b001, 0b010, 0b100, 0b100, 0b100, 0b010, 0b001],
        },
    ),
    (
        ')',
        Glyph {
            width: 3,
            rows: [0b100, 0b010, 0b001, 0b001, 0b001, 0b010, 0b100],
        },
    ),
    (
        '-',
        Glyph {
            width: 3,
            rows: [0b000, 0b000, 0b000, 0b111, 0b000, 0b000, 0b000],
        },
    ),
    (
        '.',
        Glyph {
            width: 1,
            rows: [0, 0, 0, 0, 0, 0, 1],
        },
    ),
];

fn glyph_for(ch: char) -> Option<Glyph> {
    let upper = ch.to_ascii_uppercase();
    GLYPHS
        .iter()
        .find(|(c, _)| *c == upper)
        .map(|(_, glyph)| *glyph)
}

pub struct FontSafeBackend<DB> {
    inner: DB,
}

impl<DB> FontSafeBackend<DB> {
    pub fn new(inner: DB) -> Self {
        Self { inner }
    }
}

impl<DB: DrawingBackend> DrawingBackend for FontSafeBackend<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_path(path, style)
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_circle(center, radius, style, fill)
    }

    fn blit_bitmap(
        &mut self,
        pos: BackendCoord,
        (iw, ih): (u32, u32),
        src: &[u8],
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.blit_bitmap(pos, (iw, ih), src)
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        let inner = &mut self.inner;
        match panic::catch_unwind(panic::AssertUnwindSafe(|| {
            inner.draw_text(text, style, pos)
        })) {
            Ok(Err(DrawingErrorKind::FontError(_))) | Err(_) => {
                self.draw_bitmap_text(text, style, pos)
            }
            Ok(result) => result,
        }
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        let inner = &self.inner;
        match panic::catch_unwind(panic::AssertUnwindSafe(|| {
            inner.estimate_text_size(text, style)
        })) {
            Ok(Err(DrawingErrorKind::FontError(_))) | Err(_) => {
                let (width, height) = bitmap_extent(text, style.size());
                Ok((width as u32, height as u32))
            }
            Ok(result) => result,
        }
    }
}

/// Solid color used for the fallback glyph rects.
struct Ink(BackendColor);

impl BackendStyle for Ink {
    fn color(&self) -> BackendColor {
        self.0
    }
}

/// Pixels per bitmap-font dot for a requested font size.
fn bitmap_scale(size: f64) -> i32 {
    ((size / GLYPH_HEIGHT as f64).round() as i32).max(1)
}

/// Pixel width and height of `text` in the bitmap font.
fn bitmap_extent(text: &str, size: f64) -> (i32, i32) {
    let scale = bitmap_scale(size);
    (advance_dots(text) * scale, GLYPH_HEIGHT as i32 * scale)
}

/// Horizontal advance of `text`, in font dots.
fn advance_dots(text: &str) -> i32 {
    text.chars()
        .map(|ch| glyph_for(ch).map_or(SPACE_WIDTH, |g| i32::from(g.width) + 1))
        .sum()
}

/// Lit runs of one glyph row as `(first column, run length)`.
fn lit_runs(bits: u8, width: u8) -> Vec<(u8, u8)> {
    let lit = |col: u8| bits & (1 << (width - 1 - col)) != 0;
    let mut runs = Vec::new();
    let mut col = 0;
    while col < width {
        if !lit(col) {
            col += 1;
            continue;
        }
        let first = col;
        while col < width && lit(col) {
            col += 1;
        }
        runs.push((first, col - first));
    }
    runs
}

impl<DB: DrawingBackend> FontSafeBackend<DB> {
    // Layout comes from the bitmap font alone: `layout_box` goes through the
    // same font stack that just failed.
    fn draw_bitmap_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        let ink = Ink(style.color());
        if ink.0.alpha == 0.0 {
            return Ok(());
        }

        let scale = bitmap_scale(style.size());
        let (width, height) = bitmap_extent(text, style.size());
        let anchor = style.anchor();
        let left = pos.0
            - match anchor.h_pos {
                text_anchor::HPos::Left => 0,
                text_anchor::HPos::Center => width / 2,
                text_anchor::HPos::Right => width,
            };
        let top = pos.1
            - match anchor.v_pos {
                text_anchor::VPos::Top => 0,
                text_anchor::VPos::Center => height / 2,
                text_anchor::VPos::Bottom => height,
            };

        let mut x = left;
        for ch in text.chars() {
            match glyph_for(ch) {
                Some(glyph) => {
                    self.draw_glyph(glyph, (x, top), scale, &ink)?;
                    x += (i32::from(glyph.width) + 1) * scale;
                }
                None => x += SPACE_WIDTH * scale,
            }
        }
        Ok(())
    }

    fn draw_glyph(
        &mut self,
        glyph: Glyph,
        (x, y): BackendCoord,
        scale: i32,
        ink: &Ink,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        for (row, bits) in glyph.rows.iter().enumerate() {
            let row_top = y + row as i32 * scale;
            for (first, len) in lit_runs(*bits, glyph.width) {
                let run_left = x + i32::from(first) * scale;
                let run_right = run_left + i32::from(len) * scale - 1;
                self.inner
                    .draw_rect((run_left, row_top), (run_right, row_top + scale - 1), ink, true)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use plotters::style::text_anchor::{HPos, Pos, VPos};
    use plotters::style::{FontDesc, FontFamily, FontStyle, BLACK, TRANSPARENT};

    use super::*;

    /// Backend whose system text rendering always panics.
    #[derive(Default)]
    struct BrokenFontBackend {
        rects: Vec<(BackendCoord, BackendCoord)>,
        pixels: usize,
    }

    impl DrawingBackend for BrokenFontBackend {
        type ErrorType = io::Error;

        fn get_size(&self) -> (u32, u32) {
            (400, 100)
        }

        fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<io::Error>> {
            Ok(())
        }

        fn present(&mut self) -> Result<(), DrawingErrorKind<io::Error>> {
            Ok(())
        }

        fn draw_pixel(
            &mut self,
            _point: BackendCoord,
            _color: BackendColor,
        ) -> Result<(), DrawingErrorKind<io::Error>> {
            self.pixels += 1;
            Ok(())
        }

        fn draw_rect<S: BackendStyle>(
            &mut self,
            upper_left: BackendCoord,
            bottom_right: BackendCoord,
            _style: &S,
            fill: bool,
        ) -> Result<(), DrawingErrorKind<io::Error>> {
            assert!(fill);
            self.rects.push((upper_left, bottom_right));
            Ok(())
        }

        fn draw_text<TStyle: BackendTextStyle>(
            &mut self,
            _text: &str,
            _style: &TStyle,
            _pos: BackendCoord,
        ) -> Result<(), DrawingErrorKind<io::Error>> {
            panic!("font stack broken");
        }

        fn estimate_text_size<TStyle: BackendTextStyle>(
            &self,
            _text: &str,
            _style: &TStyle,
        ) -> Result<(u32, u32), DrawingErrorKind<io::Error>> {
            Err(DrawingErrorKind::FontError(Box::new(io::Error::new(
                io::ErrorKind::NotFound,
                "no fonts",
            ))))
        }
    }

    fn font(size: f64) -> FontDesc<'static> {
        FontDesc::new(FontFamily::SansSerif, size, FontStyle::Normal)
    }

    #[test]
    fn test_title_and_axis_labels_have_glyphs() {
        for ch in "Syracuse (n = 1234567890) x y".chars().filter(|c| *c != ' ') {
            assert!(glyph_for(ch).is_some(), "missing glyph for {ch:?}");
        }
    }

    #[test]
    fn test_glyph_rows_fit_width() {
        for (ch, glyph) in GLYPHS {
            for row in glyph.rows {
                assert!(
                    u32::from(row) < (1u32 << glyph.width),
                    "glyph {ch:?} row wider than {}",
                    glyph.width
                );
            }
        }
    }

    #[test]
    fn test_lit_runs() {
        assert_eq!(lit_runs(0b01111, 5), vec![(1, 4)]);
        assert_eq!(lit_runs(0b10001, 5), vec![(0, 1), (4, 1)]);
        assert_eq!(lit_runs(0b11111, 5), vec![(0, 5)]);
        assert!(lit_runs(0, 5).is_empty());
    }

    #[test]
    fn test_broken_font_falls_back_to_bitmap_title() {
        let mut backend = FontSafeBackend::new(BrokenFontBackend::default());
        let style = font(21.0).color(&BLACK);
        let result = backend.draw_text("Syracuse (n = 15)", &style, (10, 10));

        assert!(result.is_ok());
        let rects = &backend.inner.rects;
        assert!(!rects.is_empty());
        // scale 3: every rect stays inside the 7-dot-high line starting at (10, 10)
        let width = advance_dots("Syracuse (n = 15)") * 3;
        for &((x0, y0), (x1, y1)) in rects {
            assert!(x0 >= 10 && x1 < 10 + width, "rect x {x0}..{x1}");
            assert!(y0 >= 10 && y1 < 10 + 21, "rect y {y0}..{y1}");
        }
    }

    #[test]
    fn test_bitmap_glyph_geometry() {
        let mut backend = FontSafeBackend::new(BrokenFontBackend::default());
        let style = font(21.0).color(&BLACK);
        backend.draw_text("1", &style, (100, 50)).unwrap();

        // '1' has one lit run per row; the top one is column 2.
        let rects = &backend.inner.rects;
        assert_eq!(rects.len(), 7);
        assert_eq!(rects[0], ((106, 50), (108, 52)));
        assert_eq!(rects[6], ((103, 68), (111, 70)));
    }

    #[test]
    fn test_bitmap_text_honours_center_anchor() {
        let mut backend = FontSafeBackend::new(BrokenFontBackend::default());
        let style = font(21.0)
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        backend.draw_text("11", &style, (100, 25)).unwrap();

        // two advances of 6 dots at scale 3 → 36 px wide, 21 px high
        for &((x0, y0), (x1, y1)) in &backend.inner.rects {
            assert!(x0 >= 82 && x1 < 118, "rect x {x0}..{x1}");
            assert!(y0 >= 15 && y1 < 36, "rect y {y0}..{y1}");
        }
    }

    #[test]
    fn test_transparent_text_draws_nothing() {
        let mut backend = FontSafeBackend::new(BrokenFontBackend::default());
        let style = font(21.0).color(&TRANSPARENT);
        backend.draw_text("15", &style, (0, 0)).unwrap();
        assert!(backend.inner.rects.is_empty());
        assert_eq!(backend.inner.pixels, 0);
    }

    #[test]
    fn test_broken_font_estimates_bitmap_extent() {
        let backend = FontSafeBackend::new(BrokenFontBackend::default());
        let style = font(21.0).color(&BLACK);
        assert_eq!(backend.estimate_text_size("11", &style).unwrap(), (36, 21));
    }

    #[test]
    fn test_bitmap_scale() {
        assert_eq!(bitmap_scale(2.0), 1);
        assert_eq!(bitmap_scale(20.0), 3);
        assert_eq!(bitmap_scale(28.0), 4);
    }
}

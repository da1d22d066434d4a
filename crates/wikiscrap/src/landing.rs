//! Landing page layout in logical pixels.
//!
//! Reproduces the published page box model: a centred navigation pill near
//! the top, and a vertically centred column made of the headline block
//! followed by a wrapping row of pill buttons. Text is measured with the
//! renderer's font collection and emitted as overlay text items.
//!
//! Button panels use the index of their action as id; decorative panels use
//! ids from the top of the range and are never hit.

use std::sync::Arc;

use colorbends::{
    FontWeight, Glow, Overlay, OverlayLayout, OverlayPanel, OverlayText, Rect, Rgba, TextEngine,
    TextStyle,
};
use siteconfig::{ActionSettings, ButtonStyle, PageSettings};

pub const NAV_PANEL_ID: u32 = u32::MAX;
pub const BADGE_PANEL_ID: u32 = u32::MAX - 1;

const PILL_RADIUS: f32 = 9999.0;

const NAV_TOP: f32 = 32.0;
const NAV_PADDING: (f32, f32) = (32.0, 16.0);
const BADGE_SIZE: f32 = 36.0;
const BRAND_GAP: f32 = 14.0;

const CONTENT_PADDING: f32 = 32.0;
const HEADLINE_LINE_GAP: f32 = 20.0;
const HEADLINE_MARGIN: f32 = 60.0;

const BUTTON_PADDING: (f32, f32) = (40.0, 18.0);
const BUTTON_ICON: f32 = 18.0;
const BUTTON_ICON_GAP: f32 = 14.0;
const BUTTON_GAP: f32 = 20.0;

const WHITE: Rgba = [1.0, 1.0, 1.0, 1.0];
const BLACK: Rgba = [0.0, 0.0, 0.0, 1.0];
const BLUE_400: [f32; 3] = [96.0 / 255.0, 165.0 / 255.0, 250.0 / 255.0];
const VIOLET_400: [f32; 3] = [167.0 / 255.0, 139.0 / 255.0, 250.0 / 255.0];

const BRAND_STYLE: TextStyle = TextStyle::new(20.0, FontWeight::Semibold, WHITE);
/// Headline rows are exactly one font size tall (`line-height: 1`).
const HEADLINE_STYLE: TextStyle = TextStyle::new(160.0, FontWeight::Bold, WHITE);
const BUTTON_FONT: f32 = 20.0;

fn with_alpha(rgb: [f32; 3], alpha: f32) -> Rgba {
    [rgb[0], rgb[1], rgb[2], alpha]
}

fn label_style(style: ButtonStyle) -> TextStyle {
    let color = match style {
        ButtonStyle::Primary => BLACK,
        ButtonStyle::Accent => with_alpha(BLUE_400, 1.0),
        ButtonStyle::Muted => WHITE,
    };
    TextStyle::new(BUTTON_FONT, FontWeight::Semibold, color)
}

pub fn button_size(action: &ActionSettings, text: &TextEngine) -> (f32, f32) {
    let style = label_style(action.style);
    let mut content = text.measure(&action.label, &style);
    if action.icon.is_some() {
        content += BUTTON_ICON + BUTTON_ICON_GAP;
    }
    (
        content + BUTTON_PADDING.0 * 2.0,
        style.line_height() + BUTTON_PADDING.1 * 2.0,
    )
}

fn headline_height(lines: usize) -> f32 {
    if lines == 0 {
        return 0.0;
    }
    lines as f32 * HEADLINE_STYLE.size + (lines - 1) as f32 * HEADLINE_LINE_GAP
}

/// Splits button widths into flex rows no wider than `max_width`. Every row
/// holds at least one button.
pub fn wrap_rows(widths: &[f32], max_width: f32) -> Vec<Vec<usize>> {
    let mut rows: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut used = 0.0;
    for (index, width) in widths.iter().copied().enumerate() {
        let needed = if current.is_empty() {
            width
        } else {
            used + BUTTON_GAP + width
        };
        if !current.is_empty() && needed > max_width {
            rows.push(std::mem::take(&mut current));
            used = width;
        } else {
            used = needed;
        }
        current.push(index);
    }
    if !current.is_empty() {
        rows.push(current);
    }
    rows
}

fn push_nav(overlay: &mut Overlay, page: &PageSettings, text: &TextEngine, width: f32) {
    let brand_width = text.measure(&page.brand, &BRAND_STYLE);
    let inner_height = BADGE_SIZE.max(BRAND_STYLE.line_height());
    let nav_width = BADGE_SIZE + BRAND_GAP + brand_width + NAV_PADDING.0 * 2.0;
    let nav_height = inner_height + NAV_PADDING.1 * 2.0;
    let nav_rect = Rect::new((width - nav_width) * 0.5, NAV_TOP, nav_width, nav_height);

    overlay.push(OverlayPanel {
        radius: PILL_RADIUS,
        fill: [1.0, 1.0, 1.0, 0.08],
        border: [1.0, 1.0, 1.0, 0.15],
        border_width: 1.0,
        ..OverlayPanel::new(NAV_PANEL_ID, nav_rect)
    });

    let badge_rect = Rect::new(
        nav_rect.x + NAV_PADDING.0,
        nav_rect.y + (nav_height - BADGE_SIZE) * 0.5,
        BADGE_SIZE,
        BADGE_SIZE,
    );
    overlay.push(OverlayPanel {
        radius: BADGE_SIZE * 0.5,
        fill: with_alpha(BLUE_400, 1.0),
        fill_end: Some(with_alpha(VIOLET_400, 1.0)),
        ..OverlayPanel::new(BADGE_PANEL_ID, badge_rect)
    });

    overlay.push_text(OverlayText {
        text: page.brand.clone(),
        x: badge_rect.right() + BRAND_GAP,
        y: nav_rect.y + (nav_height - BRAND_STYLE.line_height()) * 0.5,
        style: BRAND_STYLE,
    });
}

fn styled_button(id: u32, rect: Rect, style: ButtonStyle) -> OverlayPanel {
    let base = OverlayPanel {
        radius: PILL_RADIUS,
        interactive: true,
        ..OverlayPanel::new(id, rect)
    };
    match style {
        ButtonStyle::Primary => OverlayPanel {
            fill: WHITE,
            glow: Some(Glow {
                color: [1.0, 1.0, 1.0, 0.3],
                radius: 50.0,
            }),
            ..base
        },
        ButtonStyle::Accent => OverlayPanel {
            fill: with_alpha(BLUE_400, 0.15),
            border: with_alpha(BLUE_400, 0.3),
            border_width: 1.0,
            ..base
        },
        ButtonStyle::Muted => OverlayPanel {
            fill: [0.0, 0.0, 0.0, 0.3],
            border: [1.0, 1.0, 1.0, 0.2],
            border_width: 1.0,
            ..base
        },
    }
}

fn push_headline(overlay: &mut Overlay, lines: &[String], text: &TextEngine, width: f32, top: f32) {
    // The line box is taller than the row, so it is centred on the row.
    let inset = (HEADLINE_STYLE.size - HEADLINE_STYLE.line_height()) * 0.5;
    let mut y = top;
    for line in lines {
        let line_width = text.measure(line, &HEADLINE_STYLE);
        overlay.push_text(OverlayText {
            text: line.clone(),
            x: (width - line_width) * 0.5,
            y: y + inset,
            style: HEADLINE_STYLE,
        });
        y += HEADLINE_STYLE.size + HEADLINE_LINE_GAP;
    }
}

/// Lays the page out for a `width` x `height` logical viewport.
pub fn layout(page: &PageSettings, text: &TextEngine, width: f32, height: f32) -> Overlay {
    let mut overlay = Overlay::new();
    push_nav(&mut overlay, page, text, width);

    let sizes: Vec<(f32, f32)> = page
        .actions
        .iter()
        .map(|action| button_size(action, text))
        .collect();
    let widths: Vec<f32> = sizes.iter().map(|(w, _)| *w).collect();
    let rows = wrap_rows(&widths, (width - CONTENT_PADDING * 2.0).max(0.0));
    let row_height = sizes.iter().map(|(_, h)| *h).fold(0.0, f32::max);
    let buttons_height = if rows.is_empty() {
        0.0
    } else {
        rows.len() as f32 * row_height + (rows.len() - 1) as f32 * BUTTON_GAP
    };

    let headline = headline_height(page.headline.len());
    let margin = if headline > 0.0 && !rows.is_empty() {
        HEADLINE_MARGIN
    } else {
        0.0
    };
    let column_height = headline + margin + buttons_height;
    let top = ((height - column_height) * 0.5).max(CONTENT_PADDING);
    push_headline(&mut overlay, &page.headline, text, width, top);

    let mut y = top + headline + margin;
    for row in &rows {
        let row_width = row.iter().map(|&index| widths[index]).sum::<f32>()
            + (row.len() - 1) as f32 * BUTTON_GAP;
        let mut x = (width - row_width) * 0.5;
        for &index in row {
            let action = &page.actions[index];
            let (button_width, button_height) = sizes[index];
            let rect = Rect::new(
                x,
                y + (row_height - button_height) * 0.5,
                button_width,
                button_height,
            );
            overlay.push(styled_button(index as u32, rect, action.style));
            overlay.push_text(OverlayText {
                text: action.label.clone(),
                x: rect.x + BUTTON_PADDING.0,
                y: rect.y + BUTTON_PADDING.1,
                style: label_style(action.style),
            });
            x += button_width + BUTTON_GAP;
        }
        y += row_height + BUTTON_GAP;
    }

    overlay
}

pub fn overlay_layout(page: PageSettings, text: TextEngine) -> OverlayLayout {
    Arc::new(move |width, height| layout(&page, &text, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    fn engine() -> TextEngine {
        static ENGINE: OnceLock<TextEngine> = OnceLock::new();
        ENGINE.get_or_init(TextEngine::new).clone()
    }

    fn texts(overlay: &Overlay) -> Vec<&str> {
        overlay.texts().iter().map(|t| t.text.as_str()).collect()
    }

    fn buttons(overlay: &Overlay) -> Vec<&OverlayPanel> {
        overlay.panels().iter().filter(|p| p.interactive).collect()
    }

    #[test]
    fn default_page_has_nav_badge_and_three_buttons() {
        let overlay = layout(&PageSettings::default(), &engine(), 1920.0, 1080.0);
        let ids: Vec<u32> = overlay.panels().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![NAV_PANEL_ID, BADGE_PANEL_ID, 0, 1, 2]);

        let nav = &overlay.panels()[0];
        assert_eq!(nav.rect.y, 32.0);
        assert_eq!(nav.rect.height, 68.0);
        assert!((nav.rect.center().0 - 960.0).abs() < 1e-3);
        assert!(!nav.interactive);

        let badge = &overlay.panels()[1];
        assert_eq!(badge.rect.width, 36.0);
        assert_eq!(badge.rect.x, nav.rect.x + 32.0);
        assert!(badge.fill_end.is_some());
    }

    #[test]
    fn wide_viewport_puts_buttons_on_one_centred_row() {
        let overlay = layout(&PageSettings::default(), &engine(), 1920.0, 1080.0);
        let row = buttons(&overlay);
        assert_eq!(row.len(), 3);
        assert!(row.iter().all(|b| b.rect.y == row[0].rect.y));
        assert_eq!(row[0].rect.height, 60.0);
        assert!((row[1].rect.x - row[0].rect.right() - 20.0).abs() < 1e-3);

        let left = row[0].rect.x;
        let right = 1920.0 - row[2].rect.right();
        assert!((left - right).abs() < 1e-3);

        // 340 px of headline and 60 px of margin sit above the buttons.
        let column = 340.0 + 60.0 + 60.0;
        assert!((row[0].rect.y - (1080.0 - column) * 0.5 - 400.0).abs() < 1e-3);
    }

    #[test]
    fn narrow_viewport_wraps_buttons() {
        let overlay = layout(&PageSettings::default(), &engine(), 420.0, 900.0);
        let row = buttons(&overlay);
        assert_eq!(row.len(), 3);
        assert!(row[1].rect.y > row[0].rect.y);
        assert!(row[2].rect.y > row[1].rect.y);
        assert!((row[1].rect.y - row[0].rect.bottom() - 20.0).abs() < 1e-3);
        for button in row {
            assert!((button.rect.center().0 - 210.0).abs() < 1e-3);
        }
    }

    #[test]
    fn short_viewport_keeps_column_below_padding() {
        let overlay = layout(&PageSettings::default(), &engine(), 1920.0, 300.0);
        let first = buttons(&overlay)[0];
        assert!((first.rect.y - (32.0 + 340.0 + 60.0)).abs() < 1e-3);
    }

    #[test]
    fn wrap_keeps_oversized_buttons_on_their_own_row() {
        assert_eq!(wrap_rows(&[100.0, 100.0, 100.0], 340.0), vec![vec![0, 1, 2]]);
        assert_eq!(wrap_rows(&[100.0, 100.0, 100.0], 339.0), vec![vec![0, 1], vec![2]]);
        assert_eq!(wrap_rows(&[500.0, 50.0], 100.0), vec![vec![0], vec![1]]);
        assert!(wrap_rows(&[], 100.0).is_empty());
    }

    #[test]
    fn button_styles_follow_the_page() {
        let overlay = layout(&PageSettings::default(), &engine(), 1920.0, 1080.0);
        let row = buttons(&overlay);
        assert_eq!(row[0].fill, WHITE);
        assert!(row[0].glow.is_some());
        assert_eq!(row[1].border_width, 1.0);
        assert_eq!(row[1].fill[3], 0.15);
        assert_eq!(row[2].fill, [0.0, 0.0, 0.0, 0.3]);
    }

    #[test]
    fn hit_testing_maps_back_to_actions() {
        let overlay = layout(&PageSettings::default(), &engine(), 1920.0, 1080.0);
        let second = buttons(&overlay)[1];
        let (cx, cy) = second.rect.center();
        assert_eq!(overlay.hit_test(cx, cy), Some(1));

        let nav = &overlay.panels()[0];
        let (nx, ny) = nav.rect.center();
        assert_eq!(overlay.hit_test(nx, ny), None);
    }

    #[test]
    fn icon_widens_button() {
        let mut action = PageSettings::default().actions[0].clone();
        let with_icon = button_size(&action, &engine()).0;
        action.icon = None;
        assert!((with_icon - button_size(&action, &engine()).0 - 32.0).abs() < 1e-3);
    }

    #[test]
    fn default_page_draws_brand_headline_and_labels() {
        let overlay = layout(&PageSettings::default(), &engine(), 1920.0, 1080.0);
        assert_eq!(
            texts(&overlay),
            vec![
                "WikiScrap UNESCO",
                "Sites UNESCO",
                "de France",
                "Commencer",
                "Consulter le code",
                "Rapport collectif",
            ]
        );

        let headline = &overlay.texts()[1];
        let width = engine().measure("Sites UNESCO", &headline.style);
        assert!((headline.x + width * 0.5 - 960.0).abs() < 1e-2);
        assert_eq!(headline.style.weight, FontWeight::Bold);
        assert_eq!(headline.style.size, 160.0);
    }

    #[test]
    fn labels_sit_inside_their_buttons() {
        let overlay = layout(&PageSettings::default(), &engine(), 1920.0, 1080.0);
        let row = buttons(&overlay);
        let labels = &overlay.texts()[3..];
        for (button, label) in row.iter().zip(labels) {
            assert_eq!(label.x, button.rect.x + 40.0);
            assert_eq!(label.y, button.rect.y + 18.0);
            let width = engine().measure(&label.text, &label.style);
            assert!(label.x + width <= button.rect.right() - 40.0 + 1e-3);
        }
        assert_eq!(labels[0].style.color, BLACK);
        assert_eq!(labels[2].style.color, WHITE);
    }

    #[test]
    fn brand_follows_the_badge() {
        let overlay = layout(&PageSettings::default(), &engine(), 1280.0, 800.0);
        let badge = &overlay.panels()[1];
        let brand = &overlay.texts()[0];
        assert_eq!(brand.x, badge.rect.right() + 14.0);
        let nav = &overlay.panels()[0];
        assert!(brand.y > nav.rect.y && brand.y + 24.0 < nav.rect.bottom());
    }
}

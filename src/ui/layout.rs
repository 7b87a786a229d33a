use ratatui::layout::Rect;

/// Preferred panel width
pub const PANEL_WIDTH: u16 = 60;

/// Center a panel of the preferred width and the given height, shrinking to
/// fit small terminals
pub fn panel_area(area: Rect, height: u16) -> Rect {
    let width = PANEL_WIDTH.min(area.width);
    let height = height.min(area.height);

    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_panel_centered() {
        let area = panel_area(Rect::new(0, 0, 100, 40), 14);
        assert_eq!(area, Rect::new(20, 13, 60, 14));
    }

    #[test]
    fn test_panel_shrinks_to_fit() {
        let area = panel_area(Rect::new(0, 0, 30, 10), 14);
        assert_eq!(area, Rect::new(0, 0, 30, 10));
    }
}

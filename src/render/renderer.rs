//! Screen diff renderer.
//!
//! The runtime owns the whole screen, so every frame is addressed by row:
//! unchanged rows are skipped, changed rows are cleared and rewritten in
//! place. A size change (or an explicit invalidation) repaints everything.
//!
//! With a screen background set, the background SGR is active while rows are
//! cleared and each row is padded to the full width, so the colour covers the
//! whole screen and survives resets embedded in the content.

use crate::core::output::TerminalCmd;
use crate::core::style::{persist_background, Color, Style, RESET};
use crate::core::text::utils::pad_right;

#[derive(Debug, Default)]
pub struct ScreenRenderer {
    previous_lines: Vec<String>,
    previous_size: Option<(usize, usize)>,
    force_full_redraw: bool,
    background: Option<Color>,
}

/// What a render call did, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub full_redraw: bool,
    pub rows_written: usize,
}

impl ScreenRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous frame so the next render repaints every row.
    pub fn invalidate(&mut self) {
        self.force_full_redraw = true;
    }

    /// Set the screen background. A change repaints the next frame in full.
    pub fn set_background(&mut self, background: Option<Color>) {
        let background = background.filter(|bg| *bg != Color::Default);
        if background != self.background {
            self.background = background;
            self.force_full_redraw = true;
        }
    }

    pub fn background(&self) -> Option<Color> {
        self.background
    }

    pub fn previous_lines(&self) -> &[String] {
        &self.previous_lines
    }

    /// Diff `lines` against the previous frame for a `width` x `height` screen.
    ///
    /// Rows past `height` are ignored; missing rows render blank.
    pub fn render(
        &mut self,
        lines: &[String],
        width: usize,
        height: usize,
    ) -> (Vec<TerminalCmd>, RenderStats) {
        let size = (width, height);
        let full = std::mem::take(&mut self.force_full_redraw)
            || self.previous_size != Some(size);

        let mut cmds = vec![TerminalCmd::BeginSync];
        let mut stats = RenderStats {
            full_redraw: full,
            rows_written: 0,
        };
        let paint = self.background.map(|bg| Style::new().bg(bg).sgr());
        if full {
            if let Some(sgr) = &paint {
                cmds.push(TerminalCmd::bytes(sgr.as_str()));
            }
            cmds.push(TerminalCmd::ClearScreen);
            if paint.is_some() {
                cmds.push(TerminalCmd::bytes(RESET));
            }
        }

        let visible = lines.len().min(height);
        let stale_rows = if full { 0 } else { self.previous_lines.len() };
        for row in 0..visible.max(stale_rows.min(height)) {
            let new_line = lines.get(row).filter(|_| row < visible);
            let old_line = self.previous_lines.get(row);
            if !full && new_line == old_line {
                continue;
            }
            if full && new_line.map_or(true, |line| line.is_empty()) {
                continue;
            }
            cmds.push(TerminalCmd::MoveTo {
                row: row as u16,
                col: 0,
            });
            if let Some(sgr) = &paint {
                cmds.push(TerminalCmd::bytes(sgr.as_str()));
            }
            cmds.push(TerminalCmd::ClearLine);
            match (new_line, self.background) {
                (Some(line), Some(bg)) => {
                    cmds.push(TerminalCmd::Bytes(persist_background(&pad_right(line, width), bg)));
                }
                (Some(line), None) => {
                    let mut text = line.clone();
                    if text.contains('\x1b') {
                        text.push_str(RESET);
                    }
                    cmds.push(TerminalCmd::Bytes(text));
                }
                (None, Some(_)) => cmds.push(TerminalCmd::bytes(RESET)),
                (None, None) => {}
            }
            stats.rows_written += 1;
        }
        cmds.push(TerminalCmd::EndSync);

        self.previous_lines = lines[..visible].to_vec();
        self.previous_size = Some(size);
        tracing::trace!(
            full_redraw = stats.full_redraw,
            rows = stats.rows_written,
            "screen diff"
        );
        (cmds, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::ScreenRenderer;
    use crate::core::output::TerminalCmd;
    use crate::core::style::Color;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    fn written(cmds: &[TerminalCmd]) -> Vec<String> {
        cmds.iter()
            .filter_map(|cmd| match cmd {
                TerminalCmd::Bytes(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn first_frame_clears_and_paints_every_non_empty_row() {
        let mut renderer = ScreenRenderer::new();
        let (cmds, stats) = renderer.render(&lines(&["a", "", "c"]), 10, 5);
        assert!(stats.full_redraw);
        assert!(cmds.contains(&TerminalCmd::ClearScreen));
        assert_eq!(written(&cmds), vec!["a", "c"]);
        assert_eq!(stats.rows_written, 2);
    }

    #[test]
    fn unchanged_rows_are_skipped() {
        let mut renderer = ScreenRenderer::new();
        renderer.render(&lines(&["a", "b", "c"]), 10, 5);
        let (cmds, stats) = renderer.render(&lines(&["a", "B", "c"]), 10, 5);
        assert!(!stats.full_redraw);
        assert_eq!(written(&cmds), vec!["B"]);
        assert!(cmds.contains(&TerminalCmd::MoveTo { row: 1, col: 0 }));
        assert!(!cmds.contains(&TerminalCmd::ClearScreen));
    }

    #[test]
    fn shrinking_frame_clears_stale_rows() {
        let mut renderer = ScreenRenderer::new();
        renderer.render(&lines(&["a", "b", "c"]), 10, 5);
        let (cmds, stats) = renderer.render(&lines(&["a"]), 10, 5);
        assert_eq!(stats.rows_written, 2);
        assert!(written(&cmds).is_empty());
        assert!(cmds.contains(&TerminalCmd::MoveTo { row: 2, col: 0 }));
    }

    #[test]
    fn resize_and_invalidate_force_full_redraw() {
        let mut renderer = ScreenRenderer::new();
        renderer.render(&lines(&["a"]), 10, 5);
        let (_, stats) = renderer.render(&lines(&["a"]), 12, 5);
        assert!(stats.full_redraw);

        renderer.invalidate();
        let (cmds, stats) = renderer.render(&lines(&["a"]), 12, 5);
        assert!(stats.full_redraw);
        assert_eq!(written(&cmds), vec!["a"]);
    }

    #[test]
    fn rows_beyond_height_are_dropped_and_styled_rows_reset() {
        let mut renderer = ScreenRenderer::new();
        let (cmds, _) = renderer.render(&lines(&["\x1b[1mx", "y", "z"]), 10, 2);
        assert_eq!(written(&cmds), vec!["\x1b[1mx\x1b[0m", "y"]);
        assert_eq!(renderer.previous_lines().len(), 2);
    }

    #[test]
    fn background_paints_cleared_rows_and_full_width() {
        let mut renderer = ScreenRenderer::new();
        renderer.set_background(Some(Color::Rgb(10, 20, 30)));
        let (cmds, stats) = renderer.render(&lines(&["hi\x1b[0m!"]), 5, 2);
        assert!(stats.full_redraw);

        let bg = "\x1b[48;2;10;20;30m";
        let clear_at = cmds
            .iter()
            .position(|cmd| *cmd == TerminalCmd::ClearScreen)
            .expect("clear screen");
        assert_eq!(cmds[clear_at - 1], TerminalCmd::bytes(bg));
        let clear_line_at = cmds
            .iter()
            .position(|cmd| *cmd == TerminalCmd::ClearLine)
            .expect("clear line");
        assert_eq!(cmds[clear_line_at - 1], TerminalCmd::bytes(bg));
        assert_eq!(
            written(&cmds).last().map(String::as_str),
            Some("\x1b[48;2;10;20;30mhi\x1b[0m\x1b[48;2;10;20;30m!  \x1b[0m")
        );
    }

    #[test]
    fn changing_background_forces_full_redraw() {
        let mut renderer = ScreenRenderer::new();
        renderer.render(&lines(&["a"]), 10, 5);
        renderer.set_background(Some(Color::Default));
        assert_eq!(renderer.background(), None);
        let (_, stats) = renderer.render(&lines(&["a"]), 10, 5);
        assert!(!stats.full_redraw);

        renderer.set_background(Some(Color::BLUE));
        let (_, stats) = renderer.render(&lines(&["a"]), 10, 5);
        assert!(stats.full_redraw);
        let (_, stats) = renderer.render(&lines(&["a"]), 10, 5);
        assert!(!stats.full_redraw);
    }
}

//! # Text 模块
//!
//! 贪心自动换行与带描边的多行文字渲染。
//!
//! 描边的做法是在 `[-t, t]` 范围内的每个偏移上各画一遍描边色，再画填充色，
//! 开销随粗细平方增长，粗描边请谨慎使用。

use image::{Rgba, RgbaImage, imageops};
use serde::{Deserialize, Serialize};

use super::font::FontRef;

/// 贪心自动换行
///
/// - 按 `'\n'` 切分段落，段落内按空格切分单词（连续空格视为一个）
/// - 加入下一个单词会超出 `width` 时换行；单个超宽单词独占一行
/// - 空段落保留为空行
///
/// 对结果用 `'\n'` 拼接后以相同宽度再次换行，得到相同的行。
pub fn wrap_text(text: &str, width: u32, measure: impl Fn(&str) -> u32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if measure(&candidate) > width {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }
    lines
}

/// 水平对齐方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// 文字块：原文、换行结果与样式
#[derive(Debug, Clone)]
pub struct TextBlock {
    text: String,
    lines: Vec<String>,
    font: FontRef,
    wrap_width: u32,
    alignment: Alignment,
    fg: Rgba<u8>,
    bg: Option<Rgba<u8>>,
    border_thickness: u32,
    border_color: Rgba<u8>,
}

impl TextBlock {
    /// 默认白字、黑色 1 像素描边、透明背景
    pub fn new(font: FontRef, wrap_width: u32) -> Self {
        Self {
            text: String::new(),
            lines: vec![String::new()],
            font,
            wrap_width,
            alignment: Alignment::Left,
            fg: Rgba([255, 255, 255, 255]),
            bg: None,
            border_thickness: 1,
            border_color: Rgba([0, 0, 0, 255]),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn font(&self) -> &FontRef {
        &self.font
    }

    pub fn wrap_width(&self) -> u32 {
        self.wrap_width
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn border(&self) -> (u32, Rgba<u8>) {
        (self.border_thickness, self.border_color)
    }

    pub fn colors(&self) -> (Rgba<u8>, Option<Rgba<u8>>) {
        (self.fg, self.bg)
    }

    /// 设置文字并重新换行；`wrap` 为 `None` 时沿用当前宽度
    pub fn set_text(&mut self, text: &str, wrap: Option<u32>) {
        if let Some(width) = wrap {
            self.wrap_width = width;
        }
        self.text = text.to_string();
        let font = &self.font;
        self.lines = wrap_text(text, self.wrap_width, |s| font.measure(s));
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.alignment = alignment;
    }

    pub fn set_border(&mut self, thickness: u32, color: Rgba<u8>) {
        self.border_thickness = thickness;
        self.border_color = color;
    }

    pub fn set_colors(&mut self, fg: Rgba<u8>, bg: Option<Rgba<u8>>) {
        self.fg = fg;
        self.bg = bg;
    }

    /// 更换字体并按新字体重新换行
    pub fn change_font(&mut self, font: FontRef) {
        self.font = font;
        let text = std::mem::take(&mut self.text);
        self.set_text(&text, None);
    }

    /// 渲染为像素
    ///
    /// 尺寸为 `(wrap_width + 2t) x (line_height * lines + 2t)`。
    pub fn render(&self) -> RgbaImage {
        let t = self.border_thickness;
        let line_height = self.font.line_height();
        let width = self.wrap_width + 2 * t;
        let height = line_height * self.lines.len() as u32 + 2 * t;

        let mut canvas = match self.bg {
            Some(bg) => RgbaImage::from_pixel(width.max(1), height.max(1), bg),
            None => RgbaImage::new(width.max(1), height.max(1)),
        };

        let origins: Vec<(i64, i64)> = self
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let free = self.wrap_width.saturating_sub(self.font.measure(line));
                let offset = match self.alignment {
                    Alignment::Left => 0,
                    Alignment::Center => free / 2,
                    Alignment::Right => free,
                };
                ((t + offset) as i64, (t + i as u32 * line_height) as i64)
            })
            .collect();

        if t > 0 {
            let t = t as i64;
            for (line, &(x, y)) in self.lines.iter().zip(&origins) {
                if line.is_empty() {
                    continue;
                }
                let stroke = self.font.render(line, self.border_color);
                for dy in -t..=t {
                    for dx in -t..=t {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        imageops::overlay(&mut canvas, &stroke, x + dx, y + dy);
                    }
                }
            }
        }

        for (line, &(x, y)) in self.lines.iter().zip(&origins) {
            if line.is_empty() {
                continue;
            }
            let fill = self.font.render(line, self.fg);
            imageops::overlay(&mut canvas, &fill, x, y);
        }

        canvas
    }
}

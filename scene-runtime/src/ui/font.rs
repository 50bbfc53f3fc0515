//! # Font 模块
//!
//! 字体抽象：测量与单行渲染。字体文件解码由 Host 负责。

use std::fmt;
use std::rc::Rc;

use image::{Rgba, RgbaImage};

/// 字体
pub trait Font {
    /// 字体名，用于日志和比较
    fn name(&self) -> &str;

    /// 行高（像素）
    fn line_height(&self) -> u32;

    /// 单行文字宽度（像素）
    fn measure(&self, text: &str) -> u32;

    /// 渲染单行文字，背景透明
    fn render(&self, text: &str, color: Rgba<u8>) -> RgbaImage;
}

/// 共享字体引用
pub type FontRef = Rc<dyn Font>;

impl fmt::Debug for dyn Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font")
            .field("name", &self.name())
            .field("line_height", &self.line_height())
            .finish()
    }
}

/// 内置等宽块字体
///
/// 每个非空白字符渲染为一个实心块，适合无字体文件的无头运行和测试。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFont {
    name: String,
    advance: u32,
    line_height: u32,
}

impl BlockFont {
    pub fn new(name: impl Into<String>, advance: u32, line_height: u32) -> Self {
        Self {
            name: name.into(),
            advance: advance.max(1),
            line_height: line_height.max(1),
        }
    }

    /// 每个字符的步进宽度
    pub fn advance(&self) -> u32 {
        self.advance
    }
}

impl Default for BlockFont {
    fn default() -> Self {
        Self::new("block", 8, 16)
    }
}

impl Font for BlockFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn line_height(&self) -> u32 {
        self.line_height
    }

    fn measure(&self, text: &str) -> u32 {
        text.chars().count() as u32 * self.advance
    }

    fn render(&self, text: &str, color: Rgba<u8>) -> RgbaImage {
        let mut image = RgbaImage::new(self.measure(text).max(1), self.line_height);
        // 块之间留 1 像素间隙，上下各留 1 像素
        let glyph_width = self.advance.saturating_sub(1).max(1);
        let top = 1.min(self.line_height - 1);
        let bottom = self.line_height.saturating_sub(1).max(top + 1);
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let left = i as u32 * self.advance;
            for y in top..bottom {
                for x in left..left + glyph_width {
                    image.put_pixel(x, y, color);
                }
            }
        }
        image
    }
}

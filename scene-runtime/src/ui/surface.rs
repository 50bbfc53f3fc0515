//! # Surface 模块
//!
//! 绘制目标抽象。核心层只需要一个 blit 原语：把像素块贴到目标位置，
//! 可选地只取源图的一个子矩形（精灵帧）。

use image::{Rgba, RgbaImage, imageops};

use crate::geometry::Rect;

/// 绘制目标
pub trait Surface {
    /// 目标尺寸
    fn size(&self) -> (u32, u32);

    /// 贴图
    ///
    /// `dest` 的左上角为落点，宽高限制最多贴出的区域；
    /// `src` 为源图子矩形，`None` 表示整张图。
    fn blit(&mut self, pixels: &RgbaImage, dest: Rect, src: Option<Rect>);
}

/// 基于 RGBA 缓冲的画布，按 alpha 混合贴图
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// 创建透明画布
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// 用纯色填满
    pub fn clear(&mut self, color: Rgba<u8>) {
        for pixel in self.image.pixels_mut() {
            *pixel = color;
        }
    }

    /// 当前像素
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// 取出像素
    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

impl Surface for Canvas {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn blit(&mut self, pixels: &RgbaImage, dest: Rect, src: Option<Rect>) {
        let full = Rect::from_size(pixels.width(), pixels.height());
        let Some(src) = src.unwrap_or(full).intersect(&full) else {
            return;
        };
        let width = src.width.min(dest.width);
        let height = src.height.min(dest.height);
        if width == 0 || height == 0 {
            return;
        }
        let view = imageops::crop_imm(pixels, src.x as u32, src.y as u32, width, height);
        imageops::overlay(&mut self.image, &*view, dest.x as i64, dest.y as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    #[test]
    fn test_blit_full_image() {
        let mut canvas = Canvas::new(8, 8);
        let block = RgbaImage::from_pixel(2, 2, RED);
        canvas.blit(&block, Rect::new(3, 4, 2, 2), None);

        assert_eq!(*canvas.image().get_pixel(3, 4), RED);
        assert_eq!(*canvas.image().get_pixel(4, 5), RED);
        assert_eq!(canvas.image().get_pixel(5, 5).0[3], 0);
    }

    #[test]
    fn test_blit_sub_rect() {
        let mut strip = RgbaImage::from_pixel(4, 2, RED);
        for y in 0..2 {
            for x in 2..4 {
                strip.put_pixel(x, y, BLUE);
            }
        }
        let mut canvas = Canvas::new(4, 4);
        canvas.blit(&strip, Rect::new(0, 0, 2, 2), Some(Rect::new(2, 0, 2, 2)));

        assert_eq!(*canvas.image().get_pixel(0, 0), BLUE);
        assert_eq!(*canvas.image().get_pixel(1, 1), BLUE);
        assert_eq!(canvas.image().get_pixel(2, 0).0[3], 0);
    }

    #[test]
    fn test_blit_clipped_at_edges() {
        let mut canvas = Canvas::new(4, 4);
        let block = RgbaImage::from_pixel(3, 3, RED);
        canvas.blit(&block, Rect::new(-1, 2, 3, 3), None);

        assert_eq!(*canvas.image().get_pixel(0, 2), RED);
        assert_eq!(*canvas.image().get_pixel(1, 3), RED);
        assert_eq!(canvas.image().get_pixel(2, 2).0[3], 0);
    }
}

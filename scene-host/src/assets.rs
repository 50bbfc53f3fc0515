//! # Assets 模块
//!
//! 从文件系统读取并解码图片。
//!
//! ## 路径约定
//!
//! - 场景内使用**逻辑路径**：相对于资源根目录，`/` 分隔
//! - 加载时拼接资源根目录得到实际路径
//! - 开启占位图后，缺失或无法解码的图片由棋盘格图片代替，只记录警告

use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use scene_runtime::{AssetLoader, SceneError, SceneResult};
use tracing::{debug, warn};

/// 规范化逻辑路径
///
/// 统一 `/` 分隔符，去掉 `.` 组件并处理 `..`。
///
/// ```
/// use scene_host::assets::normalize_logical_path;
///
/// assert_eq!(normalize_logical_path("./bg/../bg/classroom.png"), "bg/classroom.png");
/// assert_eq!(normalize_logical_path("ui\\textbox.png"), "ui/textbox.png");
/// ```
pub fn normalize_logical_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let mut components: Vec<&str> = Vec::new();
    for component in normalized.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            _ => components.push(component),
        }
    }
    components.join("/")
}

/// 文件系统图片加载器
#[derive(Debug, Clone)]
pub struct FsAssets {
    /// 资源根目录
    base_path: PathBuf,
    /// 占位图尺寸；`None` 时加载失败直接返回错误
    placeholder: Option<(u32, u32)>,
}

impl FsAssets {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            placeholder: None,
        }
    }

    /// 加载失败时返回指定尺寸的占位图
    pub fn with_placeholder(mut self, width: u32, height: u32) -> Self {
        self.placeholder = Some((width.max(1), height.max(1)));
        self
    }

    /// 逻辑路径对应的文件路径
    pub fn resolve(&self, logical_path: &str) -> PathBuf {
        self.base_path.join(normalize_logical_path(logical_path))
    }

    fn decode(&self, path: &str) -> SceneResult<RgbaImage> {
        let full_path = self.resolve(path);
        let bytes = std::fs::read(&full_path).map_err(|e| SceneError::AssetLoad {
            path: full_path.to_string_lossy().to_string(),
            message: e.to_string(),
        })?;
        let decoded = image::load_from_memory(&bytes).map_err(|e| SceneError::AssetLoad {
            path: full_path.to_string_lossy().to_string(),
            message: e.to_string(),
        })?;
        Ok(decoded.into_rgba8())
    }
}

impl AssetLoader for FsAssets {
    fn load_image(&self, path: &str) -> SceneResult<RgbaImage> {
        match self.decode(path) {
            Ok(image) => {
                debug!(path, width = image.width(), height = image.height(), "图片加载成功");
                Ok(image)
            }
            Err(e) => match self.placeholder {
                Some((width, height)) => {
                    warn!(path, error = %e, "图片加载失败，使用占位图");
                    Ok(placeholder_image(width, height))
                }
                None => Err(e),
            },
        }
    }
}

/// 品红/黑色棋盘格占位图
pub fn placeholder_image(width: u32, height: u32) -> RgbaImage {
    const CELL: u32 = 16;
    RgbaImage::from_fn(width, height, |x, y| {
        if (x / CELL + y / CELL) % 2 == 0 {
            Rgba([255, 0, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_logical_path() {
        assert_eq!(normalize_logical_path("bg/classroom.png"), "bg/classroom.png");
        assert_eq!(normalize_logical_path("./sprite//a.png"), "sprite/a.png");
        assert_eq!(normalize_logical_path("sfx/../ui/box.png"), "ui/box.png");
        assert_eq!(normalize_logical_path("../../x.png"), "x.png");
    }

    #[test]
    fn test_load_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("bg")).unwrap();
        let expected = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]));
        expected.save(dir.path().join("bg/test.png")).unwrap();

        let assets = FsAssets::new(dir.path());
        let loaded = assets.load_image("bg/test.png").unwrap();
        assert_eq!(loaded.dimensions(), (4, 3));
        assert_eq!(*loaded.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let assets = FsAssets::new(dir.path());
        assert!(matches!(
            assets.load_image("nope.png"),
            Err(SceneError::AssetLoad { .. })
        ));

        let assets = assets.with_placeholder(32, 16);
        let image = assets.load_image("nope.png").unwrap();
        assert_eq!(image.dimensions(), (32, 16));
        assert_eq!(*image.get_pixel(0, 0), Rgba([255, 0, 255, 255]));
        assert_eq!(*image.get_pixel(16, 0), Rgba([0, 0, 0, 255]));
    }
}

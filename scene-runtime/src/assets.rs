//! # Assets 模块
//!
//! 图片资源加载接口。文件读取与解码由 Host 实现。

use std::collections::HashMap;

use image::RgbaImage;

use crate::error::{SceneError, SceneResult};

/// 资源加载器
pub trait AssetLoader {
    /// 按资源路径加载为 RGBA 像素
    fn load_image(&self, path: &str) -> SceneResult<RgbaImage>;
}

/// 内存中的资源表
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    images: HashMap<String, RgbaImage>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记资源
    pub fn insert(&mut self, path: impl Into<String>, image: RgbaImage) {
        self.images.insert(path.into(), image);
    }

    /// 登记资源（构建器形式）
    pub fn with(mut self, path: impl Into<String>, image: RgbaImage) -> Self {
        self.insert(path, image);
        self
    }
}

impl AssetLoader for MemoryAssets {
    fn load_image(&self, path: &str) -> SceneResult<RgbaImage> {
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| SceneError::AssetLoad {
                path: path.to_string(),
                message: "资源未登记".to_string(),
            })
    }
}

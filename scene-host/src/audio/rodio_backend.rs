//! rodio 音频后端
//!
//! 音频文件读成字节后缓存在共享表中，每次播放时重新解码。
//! `load_async` 在后台线程读取文件，读取完成前播放该句柄只记录警告。

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use scene_runtime::{AudioBackend, SceneError, SceneResult, SoundId};
use tracing::{debug, error, warn};

use crate::assets::normalize_logical_path;

type SharedBuffers = Arc<Mutex<HashMap<SoundId, Arc<Vec<u8>>>>>;

/// rodio 音频后端
pub struct RodioAudio {
    /// 音频输出流（必须保持存活）
    _stream: OutputStream,
    /// 音频输出句柄
    stream_handle: OutputStreamHandle,
    /// 资源根目录
    base_path: PathBuf,
    /// 逻辑路径 → 句柄
    paths: HashMap<String, SoundId>,
    /// 已读取的音频字节（后台线程写入）
    buffers: SharedBuffers,
    /// 每个句柄一个播放器
    sinks: HashMap<SoundId, Sink>,
}

impl RodioAudio {
    /// 打开默认音频设备
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self, String> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| format!("无法初始化音频输出: {}", e))?;

        Ok(Self {
            _stream: stream,
            stream_handle,
            base_path: base_path.as_ref().to_path_buf(),
            paths: HashMap::new(),
            buffers: Arc::new(Mutex::new(HashMap::new())),
            sinks: HashMap::new(),
        })
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_path.join(normalize_logical_path(path))
    }

    /// 为路径分配句柄；返回 `(句柄, 是否新分配)`
    fn handle_for(&mut self, path: &str) -> (SoundId, bool) {
        let key = normalize_logical_path(path);
        if let Some(&sound) = self.paths.get(&key) {
            return (sound, false);
        }
        let sound = SoundId::new(self.paths.len() as u64 + 1);
        self.paths.insert(key, sound);
        (sound, true)
    }

    /// 在后台线程加载音频，立即返回句柄
    pub fn load_async(&mut self, path: &str) -> SoundId {
        let (sound, fresh) = self.handle_for(path);
        if !fresh {
            return sound;
        }
        let full_path = self.resolve(path);
        let buffers = Arc::clone(&self.buffers);
        thread::spawn(move || match std::fs::read(&full_path) {
            Ok(bytes) => {
                debug!(path = %full_path.display(), "音频预加载完成");
                buffers
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(sound, Arc::new(bytes));
            }
            Err(e) => error!(path = %full_path.display(), error = %e, "音频预加载失败"),
        });
        sound
    }

    /// 音频是否已读取完成
    pub fn is_loaded(&self, sound: SoundId) -> bool {
        self.buffers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&sound)
    }

    fn bytes(&self, sound: SoundId) -> Option<Arc<Vec<u8>>> {
        self.buffers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&sound)
            .cloned()
    }
}

impl AudioBackend for RodioAudio {
    fn load(&mut self, path: &str) -> SceneResult<SoundId> {
        let (sound, fresh) = self.handle_for(path);
        if !fresh && self.is_loaded(sound) {
            return Ok(sound);
        }
        let full_path = self.resolve(path);
        let bytes = std::fs::read(&full_path).map_err(|e| SceneError::AssetLoad {
            path: full_path.to_string_lossy().to_string(),
            message: e.to_string(),
        })?;
        self.buffers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(sound, Arc::new(bytes));
        Ok(sound)
    }

    fn play(&mut self, sound: SoundId, volume: f32, looping: bool) {
        if let Some(sink) = self.sinks.get(&sound) {
            if sink.is_paused() {
                sink.set_volume(volume);
                sink.play();
                return;
            }
            sink.stop();
        }

        let Some(bytes) = self.bytes(sound) else {
            warn!(sound = sound.raw(), "音频尚未加载，忽略播放");
            return;
        };
        let source = match Decoder::new(Cursor::new(Vec::clone(&bytes))) {
            Ok(source) => source,
            Err(e) => {
                error!(sound = sound.raw(), error = %e, "无法解码音频");
                return;
            }
        };
        let sink = match Sink::try_new(&self.stream_handle) {
            Ok(sink) => sink,
            Err(e) => {
                error!(error = %e, "无法创建音频播放器");
                return;
            }
        };
        sink.set_volume(volume);
        if looping {
            sink.append(source.repeat_infinite());
        } else {
            sink.append(source);
        }
        self.sinks.insert(sound, sink);
    }

    fn stop(&mut self, sound: SoundId) {
        if let Some(sink) = self.sinks.remove(&sound) {
            sink.stop();
        }
    }

    fn pause(&mut self, sound: SoundId) {
        if let Some(sink) = self.sinks.get(&sound) {
            sink.pause();
        }
    }

    fn is_playing(&self, sound: SoundId) -> bool {
        self.sinks.get(&sound).is_some_and(|sink| !sink.empty())
    }
}

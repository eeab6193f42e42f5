//! Broadcaster configuration

use std::time::Duration;

/// Broadcaster configuration options
#[derive(Debug, Clone)]
pub struct BroadcasterConfig {
    /// Candidate device indices, tried in order on each 0→1 demand
    /// transition until one opens
    pub device_indices: Vec<u32>,

    /// Target capture and delivery cadence in frames per second
    pub target_fps: u32,

    /// Background model history length (bounds the automatic learning rate)
    pub mog2_history: u32,

    /// Background model variance threshold
    pub mog2_var_threshold: f32,

    /// Binarization threshold applied to the soft foreground mask
    pub mask_threshold: u8,

    /// Square kernel size for the morphological opening
    pub morph_kernel_size: u32,

    /// Background model learning rate; zero or negative selects automatic
    pub learning_rate: f32,

    /// Pause after a failed device read before trying again
    pub read_backoff: Duration,

    /// Bounded wait for the producer thread to exit on the last unregister
    pub stop_join_timeout: Duration,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            device_indices: vec![0, 1],
            target_fps: 30,
            mog2_history: 200,
            mog2_var_threshold: 16.0,
            mask_threshold: 120,
            morph_kernel_size: 5,
            learning_rate: 0.7,
            read_backoff: Duration::from_millis(100),
            stop_join_timeout: Duration::from_secs(2),
        }
    }
}

impl BroadcasterConfig {
    /// Set the ordered candidate device indices
    pub fn device_indices(mut self, indices: Vec<u32>) -> Self {
        self.device_indices = indices;
        self
    }

    /// Set the target frame rate (clamped to at least 1)
    pub fn target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps.max(1);
        self
    }

    /// Set the background model history length
    pub fn mog2_history(mut self, history: u32) -> Self {
        self.mog2_history = history;
        self
    }

    /// Set the background model variance threshold
    pub fn mog2_var_threshold(mut self, threshold: f32) -> Self {
        self.mog2_var_threshold = threshold;
        self
    }

    /// Set the mask binarization threshold
    pub fn mask_threshold(mut self, threshold: u8) -> Self {
        self.mask_threshold = threshold;
        self
    }

    /// Set the morphological opening kernel size
    pub fn morph_kernel_size(mut self, size: u32) -> Self {
        self.morph_kernel_size = size;
        self
    }

    /// Set the background model learning rate
    pub fn learning_rate(mut self, rate: f32) -> Self {
        self.learning_rate = rate;
        self
    }

    /// Set the read-failure backoff
    pub fn read_backoff(mut self, backoff: Duration) -> Self {
        self.read_backoff = backoff;
        self
    }

    /// Set the bounded producer join wait
    pub fn stop_join_timeout(mut self, timeout: Duration) -> Self {
        self.stop_join_timeout = timeout;
        self
    }

    /// Duration of one frame tick at the target rate
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BroadcasterConfig::default();

        assert_eq!(config.device_indices, vec![0, 1]);
        assert_eq!(config.target_fps, 30);
        assert_eq!(config.mog2_history, 200);
        assert_eq!(config.mask_threshold, 120);
        assert_eq!(config.morph_kernel_size, 5);
        assert_eq!(config.stop_join_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_frame_interval() {
        let config = BroadcasterConfig::default().target_fps(30);
        let interval = config.frame_interval();

        assert!(interval >= Duration::from_millis(33));
        assert!(interval <= Duration::from_millis(34));
    }

    #[test]
    fn test_target_fps_clamped() {
        let config = BroadcasterConfig::default().target_fps(0);

        assert_eq!(config.target_fps, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = BroadcasterConfig::default()
            .device_indices(vec![2])
            .target_fps(15)
            .mog2_history(100)
            .mog2_var_threshold(25.0)
            .mask_threshold(200)
            .morph_kernel_size(3)
            .learning_rate(0.1)
            .read_backoff(Duration::from_millis(50))
            .stop_join_timeout(Duration::from_secs(1));

        assert_eq!(config.device_indices, vec![2]);
        assert_eq!(config.target_fps, 15);
        assert_eq!(config.mog2_history, 100);
        assert_eq!(config.mog2_var_threshold, 25.0);
        assert_eq!(config.mask_threshold, 200);
        assert_eq!(config.morph_kernel_size, 3);
        assert_eq!(config.learning_rate, 0.1);
        assert_eq!(config.read_backoff, Duration::from_millis(50));
        assert_eq!(config.stop_join_timeout, Duration::from_secs(1));
    }
}

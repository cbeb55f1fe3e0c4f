use std::path::PathBuf;
use std::time::Duration;

/// Everything one extraction run needs, passed explicitly to the gate,
/// planner and executor. Defaults match the production values for
/// video.telequebec.tv.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Page the carousels live on.
    pub base_url: String,
    /// Tag embedded in the exported filename.
    pub page_label: String,
    /// Host marker; everything after its first occurrence becomes the row path.
    pub host_marker: String,
    pub out_dir: PathBuf,
    pub debug_dir: PathBuf,
    /// Scroll to the bottom until the page height settles before counting
    /// blocks, forcing lazy-loaded sections to render.
    pub full_scroll: bool,

    // Readiness gate
    pub gate_attempts: u32,
    pub page_timeout: Duration,
    /// Added to the timeout budget on each retry.
    pub retry_extension: Duration,
    pub poll_interval: Duration,
    pub cookie_timeout: Duration,

    // Navigation and settling
    pub nav_timeout: Duration,
    pub back_timeout: Duration,
    pub card_settle: Duration,
    pub show_more_settle: Duration,

    // Widget iteration caps and delays
    pub swiper_step_cap: u32,
    pub swiper_advance_delay: Duration,
    pub slick_step_cap: u32,
    pub slick_advance_delay: Duration,
    pub slick_scan_cap: u32,
    pub slick_scan_delay: Duration,

    // Lazy-load scroll
    pub scroll_cap: u32,
    pub scroll_delay: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: "https://video.telequebec.tv/".into(),
            page_label: "page_acceuil".into(),
            host_marker: ".tv/".into(),
            out_dir: PathBuf::from("output"),
            debug_dir: PathBuf::from("output/debug"),
            full_scroll: false,
            gate_attempts: 2,
            page_timeout: Duration::from_secs(35),
            retry_extension: Duration::from_secs(15),
            poll_interval: Duration::from_millis(250),
            cookie_timeout: Duration::from_secs(5),
            nav_timeout: Duration::from_secs(10),
            back_timeout: Duration::from_secs(10),
            card_settle: Duration::from_millis(800),
            show_more_settle: Duration::from_millis(500),
            swiper_step_cap: 120,
            swiper_advance_delay: Duration::from_millis(150),
            slick_step_cap: 160,
            slick_advance_delay: Duration::from_millis(200),
            slick_scan_cap: 50,
            slick_scan_delay: Duration::from_millis(300),
            scroll_cap: 20,
            scroll_delay: Duration::from_secs(3),
        }
    }
}

#[cfg(test)]
impl RunConfig {
    /// Production knobs with every delay zeroed and timeouts tightened so
    /// tests never sleep for real.
    pub fn for_tests() -> Self {
        Self {
            base_url: "https://video.example.tv/".into(),
            page_label: "page_test".into(),
            page_timeout: Duration::from_millis(50),
            retry_extension: Duration::from_millis(50),
            poll_interval: Duration::from_millis(1),
            cookie_timeout: Duration::from_millis(5),
            nav_timeout: Duration::from_millis(40),
            back_timeout: Duration::from_millis(20),
            card_settle: Duration::ZERO,
            show_more_settle: Duration::ZERO,
            swiper_advance_delay: Duration::ZERO,
            slick_advance_delay: Duration::ZERO,
            slick_scan_delay: Duration::ZERO,
            scroll_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

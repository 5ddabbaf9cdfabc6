/// Emoji prefixes for terminal output
pub struct Icons;

impl Icons {
    pub const FLASK: &str = "⚗️";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const DATABASE: &str = "🗄️";
    pub const MOLECULE: &str = "🧪";
    pub const SEED: &str = "🌱";
    pub const GLOBE: &str = "🌍";
    pub const FILE: &str = "📄";
}

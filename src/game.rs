/// Fixed product data the launcher was built for.
///
/// These values are a compatibility contract with the hosted account service
/// and the game binary; they are not user-editable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameProfile {
    pub id: u32,
    pub name: &'static str,
    pub binary_name: &'static str,
    pub default_web_url: &'static str,
    pub default_quick_connect_server: &'static str,
    pub api_url: &'static str,
    pub trusted_url: &'static str,
    pub home_folder: &'static str,
    pub legacy_home_folder: &'static str,
}

pub const CARMINE_IMPACT: GameProfile = GameProfile {
    id: 1,
    name: "Carmine Impact",
    binary_name: "cardboard_msvc.exe",
    default_web_url: "https://harpnetstudios.com/hnid/launcher/",
    default_quick_connect_server: "hnss.ga",
    api_url: "https://harpnetstudios.com/hnid/api/",
    trusted_url: "https://harpnetstudios.com",
    home_folder: "Carmine Impact Alpha",
    legacy_home_folder: "Project Crimson Alpha",
};

/// Version string of the running launcher.
pub const LAUNCHER_VERSION: &str = env!("CARGO_PKG_VERSION");

impl GameProfile {
    pub fn window_title(&self) -> String {
        format!("{} Launcher", self.name)
    }

    /// Title for a message box, optionally tagged with where it came from.
    pub fn message_title(&self, origin: Option<&str>) -> String {
        match origin {
            Some(origin) => format!("{} - {origin}", self.window_title()),
            None => self.window_title(),
        }
    }
}

impl Default for GameProfile {
    fn default() -> Self {
        CARMINE_IMPACT
    }
}

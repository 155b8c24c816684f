#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("error loading config: {0}")]
    ConfigLoad(#[from] config_file::ConfigFileError),
    #[error("invalid hex color {0:?}: expected #RRGGBB or #RRGGBBWW")]
    InvalidHexColor(String),
    #[error("invalid color value: {0}")]
    HexParse(#[from] palette::rgb::FromHexError),
    #[error("error opening UDP socket: {0}")]
    UdpBind(std::io::Error),
    #[error("error encoding OSC packet: {0:?}")]
    OscEncode(rosc::OscError),
    #[error("error sending to UDP socket: {0}")]
    UdpSend(std::io::Error),
    #[error("failed to spawn light handler thread: {0}")]
    ThreadSpawn(std::io::Error),
}

pub type Result<T> = std::result::Result<T, self::Error>;

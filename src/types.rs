/// Two-character FDSN network code.
/// Examples: `CI`, `NP`, `RE`
pub type NetworkCode = String;
/// Station code within a network.
/// Examples: `CCC`, `1737`
pub type StationCode = String;
/// Three-character channel code (band, instrument, orientation).
/// Examples: `HNZ`, `BN1`, `HHE`
pub type ChannelCode = String;
/// Location code distinguishing co-installed sensors at one site.
/// Examples: `--`, `10`, `Z4`
pub type LocationCode = String;
/// Two-character instrument code, the leading channel characters.
/// Examples: `HN`, `BN`, `HH`
pub type InstrumentCode = String;
/// Ingestion source format name.
/// Examples: `cosmos`, `dmg`, `knet`
pub type FormatName = String;
/// Canonical station group identifier used for carry-over matching.
/// Examples: `CI.CCC.HN`, `RE.1737.HN.10`
pub type GroupId = String;
/// Key into a trace or group annotation store.
/// Examples: `failure`, `corner_frequencies`
pub type ParamKey = String;
/// Label component of a collection tag (`event_station_label`).
/// Examples: `default`, `reviewed`
pub type TagLabel = String;

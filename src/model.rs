//! L2: the normalized in-memory domain model (§3).

use std::collections::BTreeMap;

/// Convert 45 kHz ticks to milliseconds.
pub fn ticks_to_ms(ticks: u32) -> f64 {
    ticks as f64 / 45.0
}

/// Default loose-signature quantization grid (§3, §4.3.1).
pub const DEFAULT_QUANT_MS: f64 = 250.0;

/// A packet identifier, codec family and human-readable name, optional language,
/// and free-form attribute bag. Produced by MPLS STN_table and CLPI ProgramInfo
/// parsing; immutable after parse.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescriptor {
    pub pid: u16,
    pub attrs: crate::codec::StreamAttributes,
}

/// Assigned by the labeling pass (§4.3.4); read by classification and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Label {
    Legal,
    Op,
    Ed,
    Preview,
    Body,
    #[default]
    Unknown,
}

/// A half-open `[in_time, out_time)` interval within one clip (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct PlayItem {
    pub clip_id: String,
    pub in_time: u32,
    pub out_time: u32,
    pub connection_condition: u8,
    pub streams: Vec<StreamDescriptor>,
    pub label: Label,
}

impl PlayItem {
    pub fn duration_ticks(&self) -> u32 {
        self.out_time.saturating_sub(self.in_time)
    }

    pub fn duration_ms(&self) -> f64 {
        ticks_to_ms(self.duration_ticks())
    }

    pub fn duration_s(&self) -> f64 {
        self.duration_ms() / 1000.0
    }

    pub fn in_ms(&self) -> f64 {
        ticks_to_ms(self.in_time)
    }

    pub fn out_ms(&self) -> f64 {
        ticks_to_ms(self.out_time)
    }

    /// `(clip_id, in_ms, out_ms)` with no quantization.
    pub fn key_exact(&self) -> (String, i64, i64) {
        (self.clip_id.clone(), self.in_ms().round() as i64, self.out_ms().round() as i64)
    }

    /// `(clip_id, in_ms, out_ms)` quantized to `quant_ms` (§3, default 250 ms):
    /// each timestamp rounds to the nearest multiple of `quant_ms`.
    pub fn key_loose(&self, quant_ms: f64) -> (String, i64, i64) {
        let q = |ms: f64| -> i64 { ((ms / quant_ms).round() * quant_ms) as i64 };
        (self.clip_id.clone(), q(self.in_ms()), q(self.out_ms()))
    }

    /// The stable [`SegmentKey`] used by segment-frequency counting, labeling,
    /// and `SegmentRef` (§3): clip id plus quantized in/out ms.
    pub fn segment_key(&self, quant_ms: f64) -> SegmentKey {
        let (clip_id, in_ms, out_ms) = self.key_loose(quant_ms);
        SegmentKey::Clip { clip_id, in_ms, out_ms }
    }
}

/// Mark type 1 = entry point; others are skip markers and bookmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkType {
    EntryPoint,
    Other(u8),
}

impl MarkType {
    pub fn from_byte(b: u8) -> MarkType {
        if b == 1 {
            MarkType::EntryPoint
        } else {
            MarkType::Other(b)
        }
    }
}

/// A chapter mark referencing its owning play item by index (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterMark {
    pub id: u32,
    pub mark_type: MarkType,
    pub play_item_ref: u16,
    pub timestamp: u32,
    pub entry_es_pid: Option<u16>,
    /// Duration in ms. Preserves the source asymmetry: MPLS stores this field in
    /// 90 kHz units but it is divided by 45 (not 90) to compute ms, matching the
    /// reference implementation's (likely buggy but bit-identical) behavior. See
    /// DESIGN.md's Open Question decision.
    pub duration_ms: f64,
}

impl ChapterMark {
    pub fn timestamp_ms(&self) -> f64 {
        ticks_to_ms(self.timestamp)
    }
}

/// A filename-keyed ordered list of play items and chapter marks (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub mpls: String,
    pub play_items: Vec<PlayItem>,
    pub marks: Vec<ChapterMark>,
    pub multi_angle: bool,
}

impl Playlist {
    pub fn duration_ms(&self) -> f64 {
        self.play_items.iter().map(PlayItem::duration_ms).sum()
    }

    pub fn duration_s(&self) -> f64 {
        self.duration_ms() / 1000.0
    }

    pub fn clip_ids(&self) -> Vec<&str> {
        self.play_items.iter().map(|pi| pi.clip_id.as_str()).collect()
    }

    /// Exact signature: the tuple of `(clip_id, in_ms, out_ms)` with no quantization.
    pub fn signature_exact(&self) -> Vec<(String, i64, i64)> {
        self.play_items.iter().map(PlayItem::key_exact).collect()
    }

    /// Loose signature: the same tuple after quantizing to `quant_ms`.
    pub fn signature_loose(&self, quant_ms: f64) -> Vec<(String, i64, i64)> {
        self.play_items.iter().map(|pi| pi.key_loose(quant_ms)).collect()
    }

    /// Parse the leading digits of the filename as a playlist number, e.g.
    /// `00010.mpls` -> `Some(10)`. Used by the menu-visibility fallback heuristic.
    pub fn playlist_number(&self) -> Option<u32> {
        playlist_number_from_name(&self.mpls)
    }
}

pub fn playlist_number_from_name(name: &str) -> Option<u32> {
    let stem = name.split('.').next().unwrap_or(name);
    let digits: String = stem.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

/// A clip id, its declared elementary streams, and an optional recorded duration
/// (from CLPI ClipInfo / sequence info).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClipInfo {
    pub clip_id: String,
    pub streams: Vec<StreamDescriptor>,
    pub recorded_duration_ms: Option<f64>,
}

/// A navigation command as stored inside a `MovieObject.bdmv` movie object.
pub type NavCommand = crate::nav::NavCommand;

/// §3: id, flag bits (resume/menu-call-mask/title-search-mask), and an ordered
/// list of decoded HDMV navigation commands.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieObject {
    pub object_id: u16,
    pub resume_intention: bool,
    pub menu_call_mask: bool,
    pub title_search_mask: bool,
    pub commands: Vec<NavCommand>,
}

impl MovieObject {
    /// Playlists reachable via `PlayPL*` commands in this object, in command
    /// order, de-duplicated.
    pub fn referenced_playlists(&self) -> Vec<u32> {
        let mut seen = Vec::new();
        for cmd in &self.commands {
            if let Some(pl) = cmd.playlist_number() {
                if !seen.contains(&pl) {
                    seen.push(pl);
                }
            }
        }
        seen
    }

    /// Titles reachable via `JumpTitle` commands in this object.
    pub fn referenced_titles(&self) -> Vec<u32> {
        let mut seen = Vec::new();
        for cmd in &self.commands {
            if let Some(t) = cmd.jump_title_number() {
                if !seen.contains(&t) {
                    seen.push(t);
                }
            }
        }
        seen
    }
}

/// The parsed contents of `MovieObject.bdmv`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieObjectBdmv {
    pub objects: Vec<MovieObject>,
}

impl MovieObjectBdmv {
    /// Map each object id to the playlists it plays, for objects that play any.
    pub fn playlist_to_objects(&self) -> BTreeMap<u16, Vec<u32>> {
        let mut map = BTreeMap::new();
        for obj in &self.objects {
            let refs = obj.referenced_playlists();
            if !refs.is_empty() {
                map.insert(obj.object_id, refs);
            }
        }
        map
    }
}

/// HDMV or BD-J; only HDMV navigation is in scope (§1 non-goals).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Hdmv,
    BdJ,
    Unknown(u8),
}

/// A title number (0-based), object type, movie-object id (HDMV only, else 0),
/// and access-type nibble (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexTitle {
    pub title_num: u16,
    pub object_type: ObjectType,
    pub movie_object_id: u16,
    pub access_type: u8,
}

/// The parsed contents of `index.bdmv`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexBdmv {
    /// Movie-object id played by the First Playback entry, if it names an HDMV object.
    pub first_playback_obj: Option<u16>,
    /// Movie-object id played by the Top Menu entry, if it names an HDMV object.
    pub top_menu_obj: Option<u16>,
    pub titles: Vec<IndexTitle>,
}

/// A button's decoded navigation hint (§3): an optional target playlist, chapter
/// index, jump-title target, and the registers it writes with immediate values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IgButtonHint {
    pub page_id: u16,
    pub button_id: u16,
    pub playlist: Option<u32>,
    pub chapter_mark: Option<u32>,
    pub jump_title: Option<u32>,
    pub register_writes: BTreeMap<u32, u32>,
}

impl IgButtonHint {
    pub fn register(&self, idx: u32) -> Option<u32> {
        self.register_writes.get(&idx).copied()
    }
}

/// A stable key identifying a segment — either a clip-derived `(clip_id, in_ms,
/// out_ms)` tuple or a synthetic `(SCENE, playlist, idx)` tuple for
/// scene-reconstructed segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SegmentKey {
    Clip { clip_id: String, in_ms: i64, out_ms: i64 },
    Scene { playlist: String, idx: usize },
}

/// One episode or scene segment (§3): a stable key, clip id, timing in ms, and
/// a label.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRef {
    pub key: SegmentKey,
    pub clip_id: String,
    pub in_ms: f64,
    pub out_ms: f64,
    pub label: Label,
}

impl SegmentRef {
    pub fn duration_ms(&self) -> f64 {
        self.out_ms - self.in_ms
    }
}

/// A 1-based ordinal, source playlist, duration, confidence, and ordered
/// segment/scene lists (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    pub episode: u32,
    pub playlist: String,
    pub duration_ms: f64,
    pub confidence: f64,
    pub segments: Vec<SegmentRef>,
    pub scenes: Vec<SegmentRef>,
}

/// The playlist classification categories (§4.3.5). `Menu` and `Preview` are
/// never produced directly by the classification rule table but remain valid
/// variants used by the special-feature and menu-visibility enrichment passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    Episode,
    PlayAll,
    Menu,
    Extra,
    Bumper,
    CreditlessOp,
    CreditlessEd,
    DigitalArchive,
    Preview,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Episode => "episode",
            Category::PlayAll => "play_all",
            Category::Menu => "menu",
            Category::Extra => "extra",
            Category::Bumper => "bumper",
            Category::CreditlessOp => "creditless_op",
            Category::CreditlessEd => "creditless_ed",
            Category::DigitalArchive => "digital_archive",
            Category::Preview => "preview",
        }
    }
}

/// A 1-based menu-visit-order index, source playlist, duration, category,
/// optional chapter-start index, and menu-visible flag (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialFeature {
    pub index: u32,
    pub playlist: String,
    pub duration_ms: f64,
    pub category: Category,
    pub chapter_start: Option<u32>,
    pub menu_visible: bool,
}

/// A stable machine code, human message, and free-form context bag (§3).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Warning {
    pub code: String,
    pub message: String,
    pub context: BTreeMap<String, String>,
}

impl Warning {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Warning {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// The open analysis accumulator written by the pipeline (§3, §4.3): per-playlist
/// classifications, Play-All names, duplicate groups, and disc navigation hints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisNotes {
    pub classifications: BTreeMap<String, Category>,
    pub play_all: Vec<String>,
    pub duplicate_groups: Vec<Vec<String>>,
    pub segment_freq_keys: usize,
    pub disc_hints: Option<crate::hints::DiscHints>,
}

/// The final, read-only result of one `scan_disc` run (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct DiscAnalysis {
    pub path: String,
    pub playlists: Vec<Playlist>,
    pub clips: BTreeMap<String, ClipInfo>,
    pub episodes: Vec<Episode>,
    pub special_features: Vec<SpecialFeature>,
    pub warnings: Vec<Warning>,
    pub notes: AnalysisNotes,
}

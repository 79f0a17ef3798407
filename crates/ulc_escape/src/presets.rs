//! Preset escape maps and option groups.

use crate::map::{slot_index, Binding, EscapeMap, ParamKind, ParamRule, DEFAULT_ESC_SYM};
use crate::pool::EscapeMapPool;
use crate::{parse, EscapeError, EscapeResult};

bitflags::bitflags! {
    /// Option-group flags applied when deriving a map from a preset.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EscapeOptions: u32 {
        const SQ        = 1 << 0;
        const DQ        = 1 << 1;
        const BS        = 1 << 2;
        const CR        = 1 << 3;
        const QUES      = 1 << 4;
        const ZERO      = 1 << 5;
        const ESCESC    = 1 << 6;
        const OCT       = 1 << 7;
        const HEX       = 1 << 8;
        const U4        = 1 << 9;
        const U8        = 1 << 10;
        const ZEROPAD   = 1 << 11;
        const EOS       = 1 << 12;
        const ESC       = 1 << 13;
        const EOL       = 1 << 14;
        const ETC       = 1 << 15;

        const LEGACY_GROUP = Self::SQ.bits() | Self::DQ.bits() | Self::BS.bits()
            | Self::CR.bits() | Self::QUES.bits() | Self::ZERO.bits()
            | Self::ESCESC.bits() | Self::OCT.bits() | Self::HEX.bits()
            | Self::ZEROPAD.bits() | Self::EOS.bits() | Self::ESC.bits()
            | Self::EOL.bits() | Self::ETC.bits();
        const MODERN_GROUP = Self::SQ.bits() | Self::DQ.bits() | Self::BS.bits()
            | Self::CR.bits() | Self::ESCESC.bits() | Self::U4.bits()
            | Self::U8.bits() | Self::ZEROPAD.bits() | Self::EOS.bits()
            | Self::ESC.bits() | Self::EOL.bits() | Self::ETC.bits();
        const VERBATIM_GROUP = Self::SQ.bits() | Self::DQ.bits() | Self::BS.bits()
            | Self::ESCESC.bits() | Self::U4.bits() | Self::U8.bits()
            | Self::ZEROPAD.bits() | Self::ESC.bits();
    }
}

/// Named preset a map derives from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EscapeMode {
    Legacy,
    LegacyFull,
    Modern,
    Verbatim,
    VerbatimModerate,
}

impl EscapeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            EscapeMode::Legacy => "legacy",
            EscapeMode::LegacyFull => "legacy_full",
            EscapeMode::Modern => "modern",
            EscapeMode::Verbatim => "verbatim",
            EscapeMode::VerbatimModerate => "verbatim_moderate",
        }
    }

    /// Options an option group may name in this mode.
    pub fn allowed(self) -> EscapeOptions {
        match self {
            EscapeMode::Legacy | EscapeMode::LegacyFull => EscapeOptions::LEGACY_GROUP,
            EscapeMode::Modern => EscapeOptions::MODERN_GROUP,
            EscapeMode::Verbatim | EscapeMode::VerbatimModerate => EscapeOptions::VERBATIM_GROUP,
        }
    }
}

/// Parse one option word, e.g. `u04` or `'`.
pub fn option_from_word(word: &str, esc_sym: u8) -> Option<EscapeOptions> {
    let opt = match word.as_bytes() {
        [b'\''] => EscapeOptions::SQ,
        [b'"'] => EscapeOptions::DQ,
        [b'\\'] => EscapeOptions::BS,
        [b'r'] => EscapeOptions::CR,
        [b'?'] => EscapeOptions::QUES,
        [b'0'] => EscapeOptions::ZERO,
        [c] if *c == esc_sym => EscapeOptions::ESCESC,
        b"u4" => EscapeOptions::U4,
        b"u04" => EscapeOptions::U4 | EscapeOptions::ZEROPAD,
        b"u8" | b"U8" => EscapeOptions::U8,
        b"u08" | b"U08" => EscapeOptions::U8 | EscapeOptions::ZEROPAD,
        b"oct" => EscapeOptions::OCT,
        b"hex" => EscapeOptions::HEX,
        b"eos" => EscapeOptions::EOS,
        b"esc" => EscapeOptions::ESC,
        b"eol" => EscapeOptions::EOL,
        b"etc" => EscapeOptions::ETC,
        _ => return None,
    };
    Some(opt)
}

/// Octal escapes bound by the `oct` option take the escape digit plus up
/// to this many more.
pub const OCTAL_DIGITS: u8 = 3;
/// The `legacy_full` preset reads at most three octal digits in total.
pub const LEGACY_OCTAL_DIGITS: u8 = 2;
pub const HEX_DIGITS: u8 = 2;

impl EscapeMap {
    /// Derive a map from `self`, then apply `options`.
    ///
    /// Slots are copied by reference; only bindings introduced by `options`
    /// are registered into `pool`. `self` is left untouched.
    pub fn dup(&self, pool: &EscapeMapPool, esc_sym: u8, options: EscapeOptions) -> EscapeResult<EscapeMap> {
        let mut dst = self.clone();
        dst.set_esc_sym(esc_sym);
        let fixed = options.contains(EscapeOptions::ZEROPAD);

        if options.contains(EscapeOptions::OCT) {
            let rule = ParamRule::new(ParamKind::Octal, OCTAL_DIGITS, fixed);
            for d in b'0'..=b'9' {
                dst.register(pool, d, Binding::Param(rule))?;
            }
        } else if options.intersects(EscapeOptions::ZERO | EscapeOptions::EOS) {
            dst.register(pool, b'0', Binding::literal(b"\0"))?;
        }

        if options.contains(EscapeOptions::HEX) {
            let rule = ParamRule::new(ParamKind::Hex, HEX_DIGITS, fixed);
            dst.register(pool, b'x', Binding::Param(rule))?;
        }
        if options.contains(EscapeOptions::U4) {
            let rule = ParamRule::new(ParamKind::Unicode, 4, fixed);
            dst.register(pool, b'u', Binding::Param(rule))?;
        }
        if options.contains(EscapeOptions::U8) {
            let rule = ParamRule::new(ParamKind::Unicode, 8, fixed);
            dst.register(pool, b'U', Binding::Param(rule))?;
        }

        let etc = options.contains(EscapeOptions::ETC);
        if options.contains(EscapeOptions::QUES) || etc {
            dst.register(pool, b'?', Binding::literal(b"?"))?;
        }
        if options.contains(EscapeOptions::SQ) || etc {
            dst.register(pool, b'\'', Binding::literal(b"'"))?;
        }
        if options.contains(EscapeOptions::DQ) || etc {
            dst.register(pool, b'"', Binding::literal(b"\""))?;
        }
        if options.contains(EscapeOptions::BS) {
            dst.register(pool, b'\\', Binding::literal(b"\\"))?;
        }
        if options.intersects(EscapeOptions::CR | EscapeOptions::EOL) {
            dst.register(pool, b'r', Binding::literal(b"\r"))?;
        }
        if options.contains(EscapeOptions::EOL) {
            dst.register(pool, b'n', Binding::literal(b"\n"))?;
        }
        if options.intersects(EscapeOptions::ESCESC | EscapeOptions::ESC) {
            dst.register(pool, esc_sym, Binding::literal(&[esc_sym]))?;
        }

        Ok(dst)
    }
}

/// Holds the preset maps and the pool they live in.
///
/// Spec compilation allocates a child pool per spec with
/// [`EscapeMapRegistry::new_pool`], so derived maps reuse preset entries.
#[derive(Debug, Clone)]
pub struct EscapeMapRegistry {
    pool: EscapeMapPool,
    esc_sym: u8,
    legacy: EscapeMap,
    legacy_full: EscapeMap,
    modern: EscapeMap,
    verbatim: EscapeMap,
    verbatim_moderate: EscapeMap,
}

impl EscapeMapRegistry {
    pub fn new() -> Self {
        Self::build(DEFAULT_ESC_SYM)
    }

    /// Build the presets around a different escape symbol.
    pub fn with_escape_symbol(esc_sym: u8) -> EscapeResult<Self> {
        if slot_index(esc_sym).is_none() {
            return Err(EscapeError::InvalidEscapeChar(esc_sym as char));
        }
        Ok(Self::build(esc_sym))
    }

    fn build(esc_sym: u8) -> Self {
        let pool = EscapeMapPool::new();
        let bind_all = |map: &mut EscapeMap, pairs: &[(u8, &[u8])]| {
            for &(ch, s) in pairs {
                map.bind(&pool, ch, Binding::literal(s));
            }
        };

        let controls: [(u8, &[u8]); 7] = [
            (b'n', b"\n"),
            (b'r', b"\r"),
            (b't', b"\t"),
            (b'b', b"\x08"),
            (b'a', b"\x07"),
            (b'v', b"\x0B"),
            (b'f', b"\x0C"),
        ];
        let self_map = [esc_sym];

        let mut legacy = EscapeMap::new(esc_sym);
        bind_all(&mut legacy, &controls);

        let mut legacy_full = EscapeMap::new(esc_sym);
        bind_all(&mut legacy_full, &controls);
        bind_all(
            &mut legacy_full,
            &[(b'"', b"\""), (b'\'', b"'"), (esc_sym, &self_map)],
        );
        let octal = ParamRule::new(ParamKind::Octal, LEGACY_OCTAL_DIGITS, false);
        for d in b'0'..=b'9' {
            legacy_full.bind(&pool, d, Binding::Param(octal));
        }
        let hex = ParamRule::new(ParamKind::Hex, HEX_DIGITS, false);
        legacy_full.bind(&pool, b'x', Binding::Param(hex));

        let mut modern = EscapeMap::new(esc_sym);
        bind_all(&mut modern, &[(b'n', b"\n"), (b't', b"\t")]);

        let verbatim = EscapeMap::new(esc_sym);

        let mut verbatim_moderate = EscapeMap::new(esc_sym);
        bind_all(&mut verbatim_moderate, &[(esc_sym, &self_map)]);

        tracing::debug!(entries = pool.len(), esc_sym = %(esc_sym as char), "escape presets built");

        Self {
            pool,
            esc_sym,
            legacy,
            legacy_full,
            modern,
            verbatim,
            verbatim_moderate,
        }
    }

    pub fn esc_sym(&self) -> u8 {
        self.esc_sym
    }

    pub fn pool(&self) -> &EscapeMapPool {
        &self.pool
    }

    /// A fresh pool that falls back to the preset pool.
    pub fn new_pool(&self) -> EscapeMapPool {
        EscapeMapPool::with_parent(&self.pool)
    }

    pub fn preset(&self, mode: EscapeMode) -> &EscapeMap {
        match mode {
            EscapeMode::Legacy => &self.legacy,
            EscapeMode::LegacyFull => &self.legacy_full,
            EscapeMode::Modern => &self.modern,
            EscapeMode::Verbatim => &self.verbatim,
            EscapeMode::VerbatimModerate => &self.verbatim_moderate,
        }
    }

    /// Build the map described by an escape-map directive.
    pub fn parse(&self, pool: &EscapeMapPool, line: &str) -> EscapeResult<EscapeMap> {
        parse::parse_escmap(self, pool, line)
    }

    /// Check `options` against what `mode` permits.
    pub fn check_options(mode: EscapeMode, options: EscapeOptions, word: &str) -> EscapeResult<()> {
        if mode.allowed().contains(options) {
            Ok(())
        } else {
            Err(EscapeError::OptionNotAllowed {
                option: word.to_string(),
                mode: mode.as_str(),
            })
        }
    }
}

impl Default for EscapeMapRegistry {
    fn default() -> Self {
        Self::new()
    }
}

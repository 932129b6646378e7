//! # News Card
//!
//! Renders newsapi.org top headlines as fixed-layout JPEG "cards": the
//! headline wrapped to three lines, the article photo scaled into a fixed
//! region, and a source credit along the bottom.
//!
//! # Architecture: Per-Article Pipeline
//!
//! ```text
//! news ──► Article ──► card ─┬─► acquire ──► cache hit?  ── yes ─► decode JPEG
//!                            │                  │ no
//!                            │                  ▼
//!                            │               fetch ─► sniff ─► decode ─► scale ─► cache
//!                            ├─► text   (wrap title by glyph width)
//!                            └─► encode JPEG ──► writer
//! ```
//!
//! Articles are processed one after another by [`builder`]. Every failure in
//! photo acquisition (unreachable URL, WEBP, corrupt bytes) degrades to a
//! placeholder on that one card; nothing short of losing the article list
//! aborts a run.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`cache`] | Expiring key/value store, in memory or persisted as JSON |
//! | [`imaging`] | Format sniffing, decode, proportional scaling, JPEG encode |
//! | [`fetch`] | Binary HTTP GET with a timeout |
//! | [`acquire`] | Cache → fetch → sniff → decode → scale → cache orchestration |
//! | [`text`] | Greedy pixel-aware word wrap |
//! | [`font`] | Glyph measurement and rasterisation |
//! | [`card`] | Card layout and composition |
//! | [`news`] | Top-headline retrieval and sanitising |
//! | [`writer`] | Saving rendered cards |
//! | [`builder`] | Batch driver for one source |
//! | [`config`] | `config.toml` loading, merging, validation |
//! | [`output`] | CLI output formatting |
//! | [`logging`] | `tracing` subscriber setup |
//!
//! # Design Decisions
//!
//! ## Sniff, Don't Trust
//!
//! Image URLs from news feeds lie: extensionless paths, `.jpg` URLs that
//! serve PNG, `Content-Type: text/html` on real photos. The decoder is
//! chosen from the first bytes of the body only ([`imaging::sniff`]), and
//! decoding never falls back to trying another format.
//!
//! ## Cache the Scaled Photo as JPEG
//!
//! What gets cached is the photo already scaled to the card's photo height
//! and re-encoded as JPEG, base64 text in a JSON file. A hit costs one small
//! decode, and the cache size does not depend on how large the publisher's
//! original was.
//!
//! ## Traits at the Seams
//!
//! Cache, network, codec, glyph rendering and file output are all traits
//! ([`cache::ExpiringCache`], [`fetch::Fetcher`], [`imaging::ImageBackend`],
//! [`font::TextRenderer`], [`writer::ImageWriter`]). Tests drive the whole
//! pipeline with in-memory fakes and a block-glyph renderer: no network, no
//! font file.

pub mod acquire;
pub mod builder;
pub mod cache;
pub mod card;
pub mod config;
pub mod fetch;
pub mod font;
pub mod imaging;
pub mod logging;
pub mod news;
pub mod output;
pub mod text;
pub mod writer;

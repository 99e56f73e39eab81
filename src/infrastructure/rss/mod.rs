// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod fetcher;
pub mod parser;
pub mod source;
pub mod template;

pub use fetcher::{FeedError, FeedFetcher, HttpFeedFetcher};
pub use parser::{FeedParser, TagFeedParser};
pub use source::RssFeedSource;
pub use template::{FeedTemplate, FeedTemplateMeta, FeedTemplateStore};

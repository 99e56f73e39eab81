// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tracing::debug;

/// XML 声明中的 encoding 属性
static XML_DECLARED_ENCODING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*<\?xml[^>]*\bencoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#)
        .expect("valid encoding regex")
});

/// 把抓取到的原始字节解码为 UTF-8 文本
///
/// 依次参考 BOM、XML 声明；都没有且不是合法 UTF-8 时使用 chardetng 探测
pub fn decode_bytes(input: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(input) {
        let (text, _) = encoding.decode_without_bom_handling(&input[bom_len..]);
        return text.into_owned();
    }

    if let Some(encoding) = declared_encoding(input) {
        if encoding != UTF_8 {
            debug!("Decoding with declared encoding {}", encoding.name());
            let (text, _) = encoding.decode_without_bom_handling(input);
            return text.into_owned();
        }
    }

    if let Ok(text) = std::str::from_utf8(input) {
        return text.to_string();
    }

    let mut detector = EncodingDetector::new();
    detector.feed(input, true);
    let encoding = detector.guess(None, true);
    debug!("Detected encoding {}", encoding.name());
    let (text, _) = encoding.decode_without_bom_handling(input);
    text.into_owned()
}

fn declared_encoding(input: &[u8]) -> Option<&'static Encoding> {
    let head = &input[..input.len().min(256)];
    let label = XML_DECLARED_ENCODING.captures(head)?.get(1)?;
    Encoding::for_label(label.as_bytes())
}

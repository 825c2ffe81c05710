/// Byte slice `start..start + len` of `path`, if it is in range.
pub fn slice_at(path: &str, start: usize, len: usize) -> Option<&str> {
    path.get(start..start.checked_add(len)?)
}

/// Slice that starts `skip` bytes after the first occurrence of `marker`.
pub fn slice_after<'a>(path: &'a str, marker: &str, skip: usize, len: usize) -> Option<&'a str> {
    let idx = path.find(marker)?;
    slice_at(path, idx + skip, len)
}

/// Slice that starts `skip` bytes after the last occurrence of `marker`.
pub fn slice_after_last<'a>(path: &'a str, marker: &str, skip: usize, len: usize) -> Option<&'a str> {
    let idx = path.rfind(marker)?;
    slice_at(path, idx + skip, len)
}

/// Parses a fixed-width decimal field. Leading zeros are fine, anything else
/// that is not a digit is rejected.
pub fn parse_id(field: &str) -> Option<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// File name without directories or extension.
pub fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_stay_in_bounds() {
        assert_eq!(slice_at("abcdef", 2, 3), Some("cde"));
        assert_eq!(slice_at("abcdef", 4, 3), None);
        assert_eq!(slice_after("x/body/b0001", "/body", 7, 4), Some("0001"));
        assert_eq!(slice_after_last("a_m0001_m0002", "_m", 2, 4), Some("0002"));
        assert_eq!(slice_after("nothing here", "/body", 7, 4), None);
    }

    #[test]
    fn slices_borrow_only_the_path() {
        let path = String::from("chara/human/c0101/obj/body/b0005/texture/x.tex");
        let found = {
            let marker = String::from("/body");
            slice_after(&path, &marker, 7, 4)
        };
        assert_eq!(found, Some("0005"));

        let last = {
            let marker = String::from("_");
            slice_after_last(&path, &marker, 1, 3)
        };
        assert_eq!(last, None);
    }

    #[test]
    fn ids_must_be_digits() {
        assert_eq!(parse_id("0037"), Some(37));
        assert_eq!(parse_id("00a7"), None);
        assert_eq!(parse_id(""), None);
        assert_eq!(parse_id("-001"), None);
    }

    #[test]
    fn stems() {
        assert_eq!(file_stem("chara/x/--c0101b0001_d.tex"), "--c0101b0001_d");
        assert_eq!(file_stem("plain"), "plain");
    }
}

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Splits `items` into consecutive chunks of at most `chunk_size`
pub fn chunk_slice<T>(items: &[T], chunk_size: usize) -> Vec<&[T]> {
    items.chunks(chunk_size.max(1)).collect()
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}

fn cmp_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Lowercased with accents stripped ("É" -> "e")
fn fold(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Case- and accent-insensitive comparison that orders digit runs by value ("page2" < "page10")
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (fold(a), fold(b));
    let mut a_chars = a.chars().peekable();
    let mut b_chars = b.chars().peekable();

    loop {
        let ord = match (a_chars.peek().copied(), b_chars.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                cmp_numeric(&take_digits(&mut a_chars), &take_digits(&mut b_chars))
            }
            (Some(x), Some(y)) => {
                a_chars.next();
                b_chars.next();
                x.cmp(&y)
            }
        };

        if ord != Ordering::Equal {
            return ord;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_boundaries() {
        let items: Vec<u32> = (0..200).collect();

        let sizes = |n: usize| -> Vec<usize> {
            chunk_slice(&items[..n], 100).iter().map(|c| c.len()).collect()
        };

        assert_eq!(sizes(0), Vec::<usize>::new());
        assert_eq!(sizes(100), vec![100]);
        assert_eq!(sizes(101), vec![100, 1]);
        assert_eq!(sizes(200), vec![100, 100]);
    }

    #[test]
    fn test_chunks_keep_order() {
        let items: Vec<u32> = (0..5).collect();
        let chunks = chunk_slice(&items, 2);
        assert_eq!(chunks, vec![&[0, 1][..], &[2, 3][..], &[4][..]]);
    }

    #[test]
    fn test_natural_cmp_numeric_runs() {
        assert_eq!(natural_cmp("page2", "page10"), Ordering::Less);
        assert_eq!(natural_cmp("domain10", "domain9"), Ordering::Greater);
        assert_eq!(natural_cmp("a007", "a7"), Ordering::Equal);
        assert_eq!(natural_cmp("2", "10"), Ordering::Less);
    }

    #[test]
    fn test_natural_cmp_ignores_case() {
        assert_eq!(natural_cmp("Miester", "miester"), Ordering::Equal);
        assert_eq!(natural_cmp("alpha", "Beta"), Ordering::Less);
        assert_eq!(natural_cmp("abc", "ab"), Ordering::Greater);
    }

    #[test]
    fn test_natural_cmp_ignores_accents() {
        assert_eq!(natural_cmp("éa", "eb"), Ordering::Less);
        assert_eq!(natural_cmp("Café", "cafe"), Ordering::Equal);
        assert_eq!(natural_cmp("Ñandu2", "nandu10"), Ordering::Less);
    }

    #[test]
    fn test_sorting_with_natural_cmp() {
        let mut names = vec!["page10", "Page2", "page1", "alpha", "page20"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["alpha", "page1", "Page2", "page10", "page20"]);
    }
}

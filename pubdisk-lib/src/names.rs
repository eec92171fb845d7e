use std::collections::HashSet;

/// splits "report.pdf" into ("report", ".pdf"). dot files and names without
/// an extension keep everything in the stem
fn split_ext(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(index) => name.split_at(index),
    }
}

/// gives every name a unique value while keeping input order. the first
/// occurrence keeps its name, later ones get " (n)" before the extension
pub fn unique_names<I, N>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = N>,
    N: AsRef<str>,
{
    let mut taken: HashSet<String> = HashSet::new();
    let mut rtn = Vec::new();

    for name in names {
        let name = name.as_ref();

        if taken.insert(name.to_owned()) {
            rtn.push(name.to_owned());
            continue;
        }

        let (stem, ext) = split_ext(name);
        let mut counter = 1;

        loop {
            let candidate = format!("{stem} ({counter}){ext}");

            if taken.insert(candidate.clone()) {
                rtn.push(candidate);
                break;
            }

            counter += 1;
        }
    }

    rtn
}

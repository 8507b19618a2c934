use console::Style;
use spotfind_core::{FilterConfig, PeakFinderConfig, PeakSearch, RejectionFlags, RejectionSummary};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    accepted: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            accepted: Style::new().green().bold(),
        }
    }
}

pub fn print_search_summary(
    config: &PeakFinderConfig,
    (frames, rows, cols): (usize, usize, usize),
    spots: usize,
) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Spot Finder"));
    println!("  {}", s.title.apply_to("\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}"));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Stack"),
        s.value.apply_to(format!("{frames} x {rows} x {cols}"))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Spots"),
        s.value.apply_to(spots)
    );
    println!();

    println!("  {}", s.header.apply_to("Search"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Threshold"),
        s.value.apply_to(config.threshold)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Size"),
        s.value.apply_to(format!("{}..={} px", config.min_size, config.max_size))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Max frames"),
        s.value.apply_to(config.max_frames)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Peak scale"),
        s.value.apply_to(config.peak_end)
    );
    let range = config.frame_range(frames);
    if range == (0..frames) {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Frames"),
            s.disabled.apply_to("all")
        );
    } else {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Frames"),
            s.value.apply_to(format!("{}..{}", range.start, range.end))
        );
    }
    println!();

    println!("  {}", s.header.apply_to("Filter"));
    match config.filter {
        FilterConfig::Delta => println!(
            "    {:<12}{}",
            s.label.apply_to("Kernel"),
            s.disabled.apply_to("none")
        ),
        _ => println!(
            "    {:<12}{}",
            s.label.apply_to("Kernel"),
            s.method.apply_to(&config.filter)
        ),
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("Octree"),
        s.value.apply_to(format!(
            "depth {}, storage {}",
            config.octree.max_depth, config.octree.max_storage
        ))
    );
    println!();
}

pub fn print_peaks(search: &PeakSearch) {
    let s = Styles::new();

    println!("  {}", s.header.apply_to("Peaks"));
    if search.peaks.is_empty() {
        println!("    {}", s.disabled.apply_to("none found"));
        println!();
        return;
    }

    println!(
        "    {}",
        s.label.apply_to(format!(
            "{:>4}  {:>8} {:>8} {:>8}  {:>6} {:>6} {:>6}  {:>6} {:>10}  status",
            "#", "x", "y", "frame", "r1", "r2", "r3", "pixels", "mass"
        ))
    );
    for (i, peak) in search.peaks.iter().enumerate() {
        let c = peak.shape.center();
        let r = peak.shape.radii();
        let row = format!(
            "{:>4}  {:>8.2} {:>8.2} {:>8.2}  {:>6.2} {:>6.2} {:>6.2}  {:>6} {:>10.0}",
            i + 1,
            c.x,
            c.y,
            c.z,
            r.x,
            r.y,
            r.z,
            peak.components,
            peak.mass
        );
        if peak.enabled() {
            println!("    {}  {}", s.value.apply_to(row), s.accepted.apply_to("ok"));
        } else {
            println!(
                "    {}  {}",
                s.label.apply_to(row),
                s.disabled.apply_to(peak.flags)
            );
        }
    }
    println!();
}

pub fn print_rejections(summary: &RejectionSummary) {
    let s = Styles::new();

    println!("  {}", s.header.apply_to("Selection"));
    println!(
        "    {:<24}{}",
        s.label.apply_to("Candidates"),
        s.value.apply_to(summary.total)
    );
    println!(
        "    {:<24}{}",
        s.label.apply_to("Accepted"),
        s.accepted.apply_to(summary.accepted())
    );
    for flag in RejectionFlags::all().iter() {
        let count = summary.count(flag);
        if count > 0 {
            println!(
                "    {:<24}{}",
                s.label.apply_to(flag.to_string()),
                s.disabled.apply_to(count)
            );
        }
    }
    println!();
}

use sim_lib::memory::{CacheConfig, HierarchyConfig};
use sim_lib::run_wrapper::run_simulation;
use sim_lib::trace::{self, AccessRecord};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    sim_lib::flags::init_logger(0);

    let param_tokens: Vec<String> = std::env::args().collect();
    let (trace, trace_base_name): (Vec<AccessRecord>, String) = match param_tokens.get(1) {
        Some(trace_path) => (
            trace::fetch_operations(trace_path)?,
            trace_path.rsplit('/').next().unwrap_or(trace_path).to_string(),
        ),
        None => (trace::synthetic(42).collect(), "synthetic".to_string()),
    };

    // Plot line series for each cache size
    // For a fixed cache size, vary the block size
    // Performance metric: AMAT of a direct-mapped cache
    let cache_sizes = vec![256, 1024, 4 * 1024, 16 * 1024];
    let block_sizes = vec![8, 16, 32, 64, 128];

    let mut data: Vec<Vec<(u64, f64)>> = vec![vec![]; cache_sizes.len()];
    let mut y_max: f64 = 0.;
    for (i, cache_size) in cache_sizes.iter().enumerate() {
        for block_size in block_sizes.iter() {
            let config = HierarchyConfig::single(
                CacheConfig::make("L1", *cache_size, *block_size, 1, 1),
                100,
            );
            let name = format!("{}B / {}B blocks", cache_size, block_size);
            let amat = run_simulation(&name, &config, trace.iter().copied())?.amat();
            data[i].push((*block_size, amat));
            y_max = y_max.max(amat);
        }
    }

    use plotters::prelude::*;

    let plot_title = format!("Single level evaluation (AMAT): {}", trace_base_name);
    std::fs::create_dir_all("eval")?;
    let output_path = format!("eval/single_eval_{}.svg", trace_base_name);

    let root = SVGBackend::new(output_path.as_str(), (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut ctx = ChartBuilder::on(&root)
        .caption(plot_title.as_str(), ("sans-serif", 40).into_font())
        .margin(5)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(8u64..128u64, 0.0..y_max * 1.1)?;
    ctx.configure_mesh().x_desc("Block size").y_desc("AMAT").draw()?;

    for (i, cache_size) in cache_sizes.iter().enumerate() {
        let series = data[i].iter().copied();
        let label = format!("Cache size = {}", cache_size);
        let color = Palette99::pick(i).to_rgba();
        ctx.draw_series(LineSeries::new(series, color))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    ctx.configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    eprintln!("Plot written to {}", output_path);

    Ok(())
}

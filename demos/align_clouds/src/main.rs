use argh::FromArgs;
use std::path::PathBuf;

use scanalign::k3d;
use scanalign::k3d::linalg::{distance3, transform_pointcloud};
use scanalign::k3d::transforms::invert_rigid;
use scanalign::ransac::{self, RansacParams, RansacResult};

#[derive(FromArgs)]
/// Align two index-aligned point clouds with RANSAC
struct Args {
    /// path to the reference point cloud A
    #[argh(option)]
    cloud_a: PathBuf,

    /// path to the point cloud B to bring into the frame of A
    #[argh(option)]
    cloud_b: PathBuf,

    /// inlier distance threshold
    #[argh(option, default = "0.5")]
    threshold: f64,

    /// fraction of inliers that ends the search early
    #[argh(option, default = "0.8")]
    early_stop_ratio: f64,

    /// maximum number of RANSAC iterations
    #[argh(option, default = "10_000")]
    max_iterations: usize,

    /// seed for reproducible sampling
    #[argh(option)]
    seed: Option<u64>,

    /// split the iterations over this many parallel shards
    #[argh(option)]
    num_shards: Option<usize>,

    /// path to write the transformed cloud B
    #[argh(option)]
    output: Option<PathBuf>,

    /// print the full result as JSON
    #[argh(switch)]
    json: bool,

    /// also print the inverse transform, mapping A onto B
    #[argh(switch)]
    inverse: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let cloud_a = k3d::io::txt::read_txt_points(&args.cloud_a)?;
    println!("Cloud A: #{} points", cloud_a.len());

    let cloud_b = k3d::io::txt::read_txt_points(&args.cloud_b)?;
    println!("Cloud B: #{} points", cloud_b.len());
    log::info!(
        "Centroids: A {:?}, B {:?}",
        cloud_a.centroid(),
        cloud_b.centroid()
    );

    let params = RansacParams {
        max_iterations: args.max_iterations,
        inlier_threshold: args.threshold,
        early_stop_ratio: args.early_stop_ratio,
        random_seed: args.seed,
    };
    log::info!("Aligning with {:?}", params);

    let result = match args.num_shards {
        Some(num_shards) => {
            ransac::align_parallel(cloud_a.points(), cloud_b.points(), &params, num_shards)?
        }
        None => ransac::align_with_params(cloud_a.points(), cloud_b.points(), &params)?,
    };

    let transformed_b = transform_pointcloud(&cloud_b, &result.rotation, &result.translation);
    let max_residual = result
        .inliers
        .iter()
        .map(|&i| distance3(&cloud_a.points()[i], &transformed_b.points()[i]))
        .fold(0.0, f64::max);
    log::info!("Largest inlier residual: {:.6}", max_residual);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    if args.inverse {
        let (rotation, translation) = invert_rigid(&result.rotation, &result.translation);
        println!("Inverse Translation Vector");
        print_row(&translation);
        println!("Inverse Rotation Matrix");
        rotation.iter().for_each(print_row);
    }

    if let Some(output) = args.output {
        k3d::io::txt::write_txt_points(&output, &transformed_b)?;
        println!("Transformed cloud B written to {}", output.display());
    }

    Ok(())
}

fn print_result(result: &RansacResult) {
    println!("Status: {:?}", result.status);
    println!(
        "Inliers: {} (rmse {:.4}) after {} iterations",
        result.num_inliers, result.rmse, result.num_iterations
    );

    println!("Translation Vector");
    print_row(&result.translation);

    println!("Rotation Matrix");
    result.rotation.iter().for_each(print_row);
}

fn print_row(row: &[f64; 3]) {
    println!("{:.4} {:.4} {:.4}", row[0], row[1], row[2]);
}

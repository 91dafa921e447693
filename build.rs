//! This build script compiles the CUDA kernels to PTX when the `cuda` feature is enabled.

fn main() {
    #[cfg(feature = "cuda")]
    cuda::build_ptx();
}

#[cfg(feature = "cuda")]
mod cuda {
    pub fn build_ptx() {
        let out_dir = std::env::var("OUT_DIR").unwrap();
        let kernel_paths: Vec<std::path::PathBuf> = glob::glob("src/**/*.cu")
            .unwrap()
            .map(|p| p.unwrap())
            .collect();

        for path in &kernel_paths {
            println!("cargo:rerun-if-changed={}", path.display());
        }

        #[cfg(feature = "ci-check")]
        for mut kernel_path in kernel_paths.into_iter() {
            kernel_path.set_extension("ptx");

            let mut ptx_path: std::path::PathBuf = out_dir.clone().into();
            ptx_path.push(kernel_path.as_path().file_name().unwrap());
            std::fs::File::create(ptx_path).unwrap();
        }

        #[cfg(not(feature = "ci-check"))]
        {
            let start = std::time::Instant::now();

            println!("cargo:rerun-if-env-changed=CUDA_COMPUTE_CAP");
            let compute_cap = match std::env::var("CUDA_COMPUTE_CAP") {
                Ok(cap) => cap.replace('.', ""),
                Err(_) => {
                    let out = std::process::Command::new("nvidia-smi")
                        .arg("--query-gpu=compute_cap")
                        .arg("--format=csv")
                        .output()
                        .expect("nvidia-smi not found, set CUDA_COMPUTE_CAP");
                    let out = std::str::from_utf8(&out.stdout).unwrap();
                    let mut lines = out.lines();
                    assert_eq!(lines.next().unwrap(), "compute_cap");
                    lines.next().unwrap().replace('.', "")
                }
            };

            let children = kernel_paths
                .iter()
                .map(|p| {
                    std::process::Command::new("nvcc")
                        .arg(format!("--gpu-architecture=sm_{compute_cap}"))
                        .arg("--ptx")
                        .args(["--default-stream", "per-thread"])
                        .args(["--output-directory", &out_dir])
                        .arg(p)
                        .spawn()
                        .expect("nvcc not found")
                })
                .collect::<Vec<_>>();

            for (kernel_path, child) in kernel_paths.iter().zip(children.into_iter()) {
                let output = child.wait_with_output().unwrap();
                assert!(
                    output.status.success(),
                    "nvcc error while compiling {kernel_path:?}: {output:?}",
                );
            }

            println!(
                "cargo:warning=Compiled {:?} cuda kernels in {:?}",
                kernel_paths.len(),
                start.elapsed()
            );
        }
    }
}

// demos/scan_adapters.rs — list every compute adapter wgpu can see.
//
// Useful when the driver reports "no GPU-class adapter": it shows what is
// actually visible, including the software rasterizers the driver rejects.
//
// USAGE
//   cargo run --example scan_adapters

fn main() {
    env_logger::init();

    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    });

    let adapters: Vec<wgpu::Adapter> = instance
        .enumerate_adapters(wgpu::Backends::PRIMARY)
        .into_iter()
        .collect();

    if adapters.is_empty() {
        println!("no adapters visible");
        return;
    }

    for a in &adapters {
        let info = a.get_info();
        let verdict = if info.device_type == wgpu::DeviceType::Cpu {
            "rejected (software)"
        } else {
            "usable"
        };
        println!(
            "{} — backend {:?}, type {:?}, vendor {:#06x}, device {:#06x} [{verdict}]",
            info.name, info.backend, info.device_type, info.vendor, info.device
        );
        let limits = a.limits();
        println!(
            "    max workgroup x: {}, max invocations/group: {}, max groups/dim: {}",
            limits.max_compute_workgroup_size_x,
            limits.max_compute_invocations_per_workgroup,
            limits.max_compute_workgroups_per_dimension
        );
    }
}

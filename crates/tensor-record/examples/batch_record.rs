use anyhow::Result;
use ndarray::ArrayD;
use tensor_record::{extent, KeyedSize, KeyedTensors, TensorRecord};

#[derive(TensorRecord)]
struct MiniBatch {
    images: ArrayD<f32>,
    labels: ArrayD<f32>,
}

fn main() -> Result<()> {
    let batch = MiniBatch {
        images: ArrayD::zeros(extent((32, 3, 28, 28))),
        labels: ArrayD::zeros(extent((32,))),
    };

    println!("fields: {:?}", MiniBatch::FIELDS);
    println!("tensor fields: {:?}", MiniBatch::TENSOR_FIELDS);

    let shape = batch.shape();
    println!("images extent: {:?}", shape.images);
    println!("labels extent: {:?}", shape.labels);
    println!("element counts: {:?}", shape.numel());

    let rebuilt = MiniBatch::from_keyedtensors(
        batch
            .keyedtensors()
            .into_iter()
            .map(|(name, tensor)| (name, tensor.clone())),
    )?;
    println!("rebuilt shape matches: {}", rebuilt.shape() == shape);

    Ok(())
}

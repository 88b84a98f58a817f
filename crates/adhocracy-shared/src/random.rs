use rand::distributions::DistString as _;

const DEF_LEN: usize = 32;

pub fn random_string(len: usize) -> String {
    rand::distributions::Alphanumeric.sample_string(&mut rand::thread_rng(), len)
}

pub fn random_string_def_len() -> String {
    random_string(DEF_LEN)
}

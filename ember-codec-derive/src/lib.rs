extern crate proc_macro;
use proc_macro::TokenStream;

mod decode;
mod encode;

#[proc_macro_derive(Decode)]
pub fn decode(input: TokenStream) -> TokenStream {
    let ast = syn::parse(input).unwrap();
    decode::impl_decode_macro(&ast)
}

#[proc_macro_derive(Encode)]
pub fn encode(input: TokenStream) -> TokenStream {
    let ast = syn::parse(input).unwrap();
    encode::impl_encode_macro(&ast)
}
